//! The shipped `config/` directory must load and match the built-in defaults.

use civic_core::categorizer::Categorizer;
use civic_core::enrich::CityDirectory;
use civic_core::schema::IdeaCategory;
use civic_core::scoring::PrioritizerConfig;
use std::path::PathBuf;

fn config_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config")
}

#[test]
fn prioritizer_config_matches_defaults() {
    let loaded = PrioritizerConfig::load_from_dir(&config_dir()).unwrap();
    assert_eq!(loaded, PrioritizerConfig::default());
}

#[test]
fn category_table_matches_defaults() {
    let loaded = Categorizer::load_from_dir(&config_dir()).unwrap();
    let builtin = Categorizer::default();
    for (title, text) in [
        ("New football pitch", "Soccer near the school"),
        ("Trees", "more trees and less garbage"),
        ("", "nothing relevant at all"),
    ] {
        assert_eq!(loaded.categorize(title, text), builtin.categorize(title, text));
    }
    assert_eq!(
        loaded.categorize("Mural", "paint a mural").main_category,
        IdeaCategory::Art
    );
}

#[test]
fn city_table_matches_defaults() {
    let loaded = CityDirectory::load_from_dir(&config_dir()).unwrap();
    let builtin = CityDirectory::default();
    assert_eq!(loaded.cities(), builtin.cities());
    assert_eq!(loaded.population("somewhere else"), 50_000);
}

#[test]
fn missing_directory_falls_back_to_defaults() {
    let dir = config_dir().join("does-not-exist");
    assert_eq!(
        PrioritizerConfig::load_from_dir(&dir).unwrap(),
        PrioritizerConfig::default()
    );
    assert_eq!(CityDirectory::load_from_dir(&dir).unwrap().population("Barnaul"), 632_372);
}
