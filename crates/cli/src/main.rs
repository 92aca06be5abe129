use anyhow::{Context, Result, bail};
use civic_core::analytics::{self, UserStats};
use civic_core::categorizer::{Categorizer, ExistingIdea};
use civic_core::db::{self, IdeaFilter};
use civic_core::enrich::{self, Assessment, CityDirectory};
use civic_core::geo::Coordinate;
use civic_core::ranking;
use civic_core::schema::{
    IdeaCategory, IdeaStatus, InfrastructureObject, NewIdea, NewUser, VoteDirection,
};
use civic_core::scoring::{Prioritizer, PrioritizerConfig, PriorityTier};
use clap::{Args, Parser, Subcommand};
use notify::{LogSink, NotificationSink, Notifier, OutboxSink};
use rusqlite::Connection;
use schemars::schema_for;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use time::{Duration, OffsetDateTime};
use tracing::info;
use tracing_subscriber::EnvFilter;

const RECENT_FOR_DUPLICATES: usize = 100;
const RANK_BATCH: usize = 100;
const MAX_RANK_LIMIT: usize = 50;

#[derive(Parser)]
#[command(name = "civic")]
#[command(about = "Civic idea prioritization CLI", long_about = None)]
struct Cli {
    /// SQLite database path
    #[arg(long, global = true, env = "CIVIC_DB", default_value = "civic.db")]
    db: String,

    /// Directory holding prioritizer.toml, categories.yaml and cities.yaml
    #[arg(long, global = true, default_value = "config")]
    config_dir: PathBuf,

    /// City used for population lookups and message headers
    #[arg(long, global = true, default_value = "Kiselyovsk")]
    city: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    Init,
    /// Export JSON Schemas for the data model
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    Idea {
        #[command(subcommand)]
        command: IdeaCommands,
    },
    /// Infrastructure reference data
    Infra {
        #[command(subcommand)]
        command: InfraCommands,
    },
    /// Categorize free text and look for textual duplicates among recent ideas
    Categorize {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long)]
        text: String,
    },
    /// Score one idea and store the result
    Score {
        id: String,
        /// Print the result without writing it back
        #[arg(long)]
        dry_run: bool,
    },
    /// Score the most recent ideas and rank them
    Rank {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Aggregate counts, trends and heatmap
    Analytics {
        #[arg(long, default_value_t = 30)]
        period_days: u32,
    },
    /// Announce an idea to a chat
    Notify {
        id: String,
        #[arg(long)]
        chat: String,
        #[command(flatten)]
        delivery: Delivery,
    },
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Export JSON Schema files for canonical types
    Export {
        /// Output directory (default: ./schemas)
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        chat_id: Option<String>,
    },
}

#[derive(Subcommand)]
enum IdeaCommands {
    /// Submit an idea; it is categorized when no category is given and scored right away
    Submit {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        category: Option<IdeaCategory>,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long)]
        address: Option<String>,
        #[arg(long = "photo-url")]
        photo_urls: Vec<String>,
        /// Author user id; anonymous when omitted
        #[arg(long)]
        author: Option<String>,
    },
    Show {
        id: String,
    },
    List {
        #[arg(long)]
        category: Option<IdeaCategory>,
        #[arg(long)]
        status: Option<IdeaStatus>,
        #[arg(long)]
        priority: Option<PriorityTier>,
        #[arg(long, default_value_t = 0)]
        skip: usize,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Move an idea along its lifecycle
    Status {
        id: String,
        status: IdeaStatus,
        /// Moderator override of the lifecycle rules
        #[arg(long = "override")]
        moderation_override: bool,
        /// Chat to tell about the change
        #[arg(long)]
        notify_chat: Option<String>,
        #[command(flatten)]
        delivery: Delivery,
    },
    /// Re-run the categorizer on a stored idea and keep its verdict
    Recategorize {
        id: String,
    },
    Delete {
        id: String,
    },
    Comment {
        id: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        text: String,
    },
    Vote {
        id: String,
        #[arg(long)]
        voter: String,
        #[arg(long, default_value = "up")]
        direction: VoteDirection,
        #[arg(long)]
        notify_chat: Option<String>,
        #[command(flatten)]
        delivery: Delivery,
    },
}

#[derive(Subcommand)]
enum InfraCommands {
    /// Upsert objects from a JSON array file
    Import { file: PathBuf },
}

#[derive(Args)]
struct Delivery {
    /// Queue messages in this outbox directory instead of logging them
    #[arg(long)]
    outbox: Option<PathBuf>,

    #[arg(long, default_value = "https://city.example")]
    site_url: String,
}

struct Settings {
    prioritizer: Prioritizer,
    categorizer: Categorizer,
    cities: CityDirectory,
}

impl Settings {
    fn load(dir: &Path) -> Result<Self> {
        let config = PrioritizerConfig::load_from_dir(dir)
            .with_context(|| format!("loading prioritizer config from {}", dir.display()))?;
        Ok(Self {
            prioritizer: Prioritizer::new(config)?,
            categorizer: Categorizer::load_from_dir(dir)?,
            cities: CityDirectory::load_from_dir(dir)?,
        })
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            db::open(&cli.db)?;
            info!(db = %cli.db, "database ready");
            Ok(())
        }
        Commands::Schema { command } => match command {
            SchemaCommands::Export { out_dir } => schema_export(out_dir),
        },
        command => {
            let conn = db::open(&cli.db)?;
            let settings = Settings::load(&cli.config_dir)?;
            run(&conn, &settings, &cli.city, command)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if std::env::var("LOG_FORMAT").unwrap_or_default() == "json" {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

fn run(conn: &Connection, settings: &Settings, city: &str, command: Commands) -> Result<()> {
    let now = OffsetDateTime::now_utc();
    let population = settings.cities.population(city);

    match command {
        Commands::User { command } => match command {
            UserCommands::Create {
                email,
                full_name,
                phone,
                chat_id,
            } => {
                let user = db::create_user(
                    conn,
                    &NewUser {
                        email,
                        full_name,
                        phone,
                        chat_id,
                    },
                    now,
                )?;
                print_json(&user)
            }
        },
        Commands::Idea { command } => idea_command(conn, settings, city, command, now),
        Commands::Infra { command } => match command {
            InfraCommands::Import { file } => {
                let raw = fs::read_to_string(&file)
                    .with_context(|| format!("reading {}", file.display()))?;
                let objects: Vec<InfrastructureObject> = serde_json::from_str(&raw)
                    .with_context(|| format!("parsing {}", file.display()))?;
                for object in &objects {
                    db::upsert_infrastructure(conn, object)
                        .with_context(|| format!("importing object {}", object.id))?;
                }
                info!(count = objects.len(), "imported infrastructure objects");
                print_json(&serde_json::json!({ "imported": objects.len() }))
            }
        },
        Commands::Categorize { title, text } => {
            let categorization = settings.categorizer.categorize(&title, &text);
            let recent = db::recent_ideas(conn, RECENT_FOR_DUPLICATES)?;
            let duplicates = settings.categorizer.find_duplicates(&text, &existing(&recent));
            print_json(&serde_json::json!({
                "categorization": categorization,
                "duplicates": duplicates,
            }))
        }
        Commands::Score { id, dry_run } => {
            let idea = db::require_idea(conn, &id)?;
            let assessment = if dry_run {
                enrich::assess(conn, &settings.prioritizer, idea, population, now)?
            } else {
                enrich::assess_and_store(conn, &settings.prioritizer, idea, population, now)?
            };
            print_json(&assessment)
        }
        Commands::Rank { limit } => {
            if limit == 0 || limit > MAX_RANK_LIMIT {
                bail!("--limit must be within 1..={MAX_RANK_LIMIT}");
            }
            let ideas = db::recent_ideas(conn, RANK_BATCH)?;
            let assessments = ideas
                .into_iter()
                .map(|idea| enrich::assess(conn, &settings.prioritizer, idea, population, now))
                .collect::<Result<Vec<Assessment>>>()?;
            let mut ranked = ranking::rank(assessments);
            for group in ranked.by_priority.values_mut() {
                group.truncate(limit);
            }
            print_json(&ranked)
        }
        Commands::Analytics { period_days } => {
            let ideas = db::all_ideas(conn)?;
            let users = UserStats {
                total_users: db::count_users(conn)?,
                new_users_in_period: db::count_users_since(
                    conn,
                    now - Duration::days(i64::from(period_days)),
                )?,
            };
            let report = analytics::summarize(&ideas, users, now, period_days)?;
            print_json(&report)
        }
        Commands::Notify { id, chat, delivery } => {
            let idea = db::require_idea(conn, &id)?;
            with_notifier(&delivery, city, |notifier| notifier.idea_submitted(&chat, &idea))?;
            print_json(&serde_json::json!({ "status": "notification_sent", "chat": chat }))
        }
        Commands::Init | Commands::Schema { .. } => Ok(()),
    }
}

#[derive(Serialize)]
struct Submission {
    #[serde(flatten)]
    assessment: Assessment,
    categorization: Option<civic_core::categorizer::Categorization>,
    duplicates: Vec<civic_core::categorizer::DuplicateMatch>,
}

fn idea_command(
    conn: &Connection,
    settings: &Settings,
    city: &str,
    command: IdeaCommands,
    now: OffsetDateTime,
) -> Result<()> {
    match command {
        IdeaCommands::Submit {
            title,
            description,
            category,
            lat,
            lon,
            address,
            photo_urls,
            author,
        } => {
            let draft = NewIdea {
                title,
                description,
                category,
                location: Coordinate::new(lat, lon),
                address,
                photo_urls,
            };
            draft.validate()?;

            let categorization = match draft.category {
                Some(_) => None,
                None => Some(settings.categorizer.categorize(&draft.title, &draft.description)),
            };
            let category = draft
                .category
                .or(categorization.as_ref().map(|c| c.main_category))
                .unwrap_or(IdeaCategory::Other);

            let recent = db::recent_ideas(conn, RECENT_FOR_DUPLICATES)?;
            let duplicates = settings
                .categorizer
                .find_duplicates(&draft.description, &existing(&recent));

            let idea = db::create_idea(conn, &draft, category, author.as_deref(), now)?;
            let population = settings.cities.population(city);
            let assessment =
                enrich::assess_and_store(conn, &settings.prioritizer, idea, population, now)?;
            print_json(&Submission {
                assessment,
                categorization,
                duplicates,
            })
        }
        IdeaCommands::Show { id } => {
            let idea = db::require_idea(conn, &id)?;
            let comments = db::comments_for(conn, &id)?;
            let votes = db::votes_for(conn, &id)?;
            print_json(&serde_json::json!({
                "idea": idea,
                "votes": votes,
                "comments": comments,
            }))
        }
        IdeaCommands::List {
            category,
            status,
            priority,
            skip,
            limit,
        } => {
            let ideas = db::list_ideas(
                conn,
                &IdeaFilter {
                    category,
                    status,
                    priority,
                    skip,
                    limit,
                },
            )?;
            print_json(&ideas)
        }
        IdeaCommands::Status {
            id,
            status,
            moderation_override,
            notify_chat,
            delivery,
        } => {
            let idea = db::update_status(conn, &id, status, moderation_override, now)?;
            if let Some(chat) = notify_chat {
                with_notifier(&delivery, city, |notifier| notifier.status_changed(&chat, &idea))?;
            }
            print_json(&idea)
        }
        IdeaCommands::Recategorize { id } => {
            let idea = db::require_idea(conn, &id)?;
            let categorization = settings.categorizer.categorize(&idea.title, &idea.description);
            if categorization.main_category != idea.category {
                db::update_category(conn, &id, categorization.main_category, now)?;
                info!(idea_id = %id, from = %idea.category, to = %categorization.main_category, "recategorized idea");
            }
            print_json(&categorization)
        }
        IdeaCommands::Delete { id } => {
            if !db::delete_idea(conn, &id)? {
                bail!("idea not found: {id}");
            }
            print_json(&serde_json::json!({ "deleted": id }))
        }
        IdeaCommands::Comment { id, author, text } => {
            let comment = db::add_comment(conn, &id, &author, &text, now)?;
            print_json(&comment)
        }
        IdeaCommands::Vote {
            id,
            voter,
            direction,
            notify_chat,
            delivery,
        } => {
            let vote = db::cast_vote(conn, &id, &voter, direction, now)?;
            let votes_count = db::require_idea(conn, &id)?.votes_count;
            if let Some(chat) = notify_chat {
                with_notifier(&delivery, city, |notifier| notifier.vote_recorded(&chat, direction))?;
            }
            print_json(&serde_json::json!({
                "vote": vote,
                "new_votes_count": votes_count,
            }))
        }
    }
}

fn with_notifier<F>(delivery: &Delivery, city: &str, send: F) -> Result<()>
where
    F: FnOnce(&Notifier<Box<dyn NotificationSink>>) -> Result<()>,
{
    let sink: Box<dyn NotificationSink> = match &delivery.outbox {
        Some(dir) => Box::new(OutboxSink::open(dir)?),
        None => Box::new(LogSink),
    };
    send(&Notifier::new(sink, delivery.site_url.clone(), city))
}

fn existing(ideas: &[civic_core::schema::Idea]) -> Vec<ExistingIdea<'_>> {
    ideas
        .iter()
        .map(|idea| ExistingIdea {
            id: &idea.id,
            title: &idea.title,
            description: &idea.description,
        })
        .collect()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn schema_export(out_dir: PathBuf) -> Result<()> {
    fs::create_dir_all(&out_dir)?;

    write_schema(&out_dir, "Idea", schema_for!(civic_core::schema::Idea))?;
    write_schema(&out_dir, "NewIdea", schema_for!(civic_core::schema::NewIdea))?;
    write_schema(&out_dir, "User", schema_for!(civic_core::schema::User))?;
    write_schema(&out_dir, "Vote", schema_for!(civic_core::schema::Vote))?;
    write_schema(&out_dir, "Comment", schema_for!(civic_core::schema::Comment))?;
    write_schema(
        &out_dir,
        "InfrastructureObject",
        schema_for!(civic_core::schema::InfrastructureObject),
    )?;
    write_schema(
        &out_dir,
        "PriorityResult",
        schema_for!(civic_core::scoring::PriorityResult),
    )?;

    println!("Exported schemas to {}", out_dir.display());
    Ok(())
}

fn write_schema(out_dir: &Path, name: &str, schema: schemars::schema::RootSchema) -> Result<()> {
    let json = serde_json::to_string_pretty(&schema)?;
    fs::write(out_dir.join(format!("{name}.schema.json")), json)?;
    Ok(())
}
