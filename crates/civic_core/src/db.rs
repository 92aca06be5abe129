use crate::error::CivicError;
use crate::geo::Coordinate;
use crate::schema::{
    Comment, Idea, IdeaCategory, IdeaStatus, InfrastructureObject, NewIdea, NewUser, User, Vote,
    VoteDirection, format_timestamp,
};
use crate::scoring::{PriorityResult, PriorityTier};
use anyhow::Result;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

pub const ANONYMOUS_EMAIL: &str = "anonymous@civic.local";
const METERS_PER_DEGREE: f64 = 111_194.93;

pub fn open(db_path: &str) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    init(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    init(&conn)?;
    Ok(conn)
}

fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
          id TEXT PRIMARY KEY,
          email TEXT NOT NULL UNIQUE,
          full_name TEXT,
          phone TEXT,
          points INTEGER NOT NULL DEFAULT 0,
          is_active INTEGER NOT NULL DEFAULT 1,
          is_verified INTEGER NOT NULL DEFAULT 0,
          chat_id TEXT,
          created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS ideas (
          id TEXT PRIMARY KEY,
          title TEXT NOT NULL,
          description TEXT NOT NULL,
          category TEXT NOT NULL,
          status TEXT NOT NULL DEFAULT 'new',
          latitude REAL NOT NULL,
          longitude REAL NOT NULL,
          address TEXT,
          author_id TEXT NOT NULL REFERENCES users(id),
          votes_count INTEGER NOT NULL DEFAULT 0,
          comments_count INTEGER NOT NULL DEFAULT 0,
          duplicate_count INTEGER NOT NULL DEFAULT 0,
          importance_score REAL,
          infrastructure_deficit REAL,
          social_weight REAL,
          priority TEXT,
          photo_urls_json TEXT NOT NULL DEFAULT '[]',
          created_at TEXT NOT NULL,
          updated_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_ideas_category ON ideas(category);
        CREATE INDEX IF NOT EXISTS idx_ideas_status ON ideas(status);
        CREATE INDEX IF NOT EXISTS idx_ideas_importance ON ideas(importance_score);
        CREATE INDEX IF NOT EXISTS idx_ideas_created_at ON ideas(created_at);

        CREATE TABLE IF NOT EXISTS votes (
          id TEXT PRIMARY KEY,
          idea_id TEXT NOT NULL REFERENCES ideas(id) ON DELETE CASCADE,
          voter_id TEXT NOT NULL REFERENCES users(id),
          direction TEXT NOT NULL,
          created_at TEXT NOT NULL,
          UNIQUE (idea_id, voter_id)
        );

        CREATE TABLE IF NOT EXISTS comments (
          id TEXT PRIMARY KEY,
          idea_id TEXT NOT NULL REFERENCES ideas(id) ON DELETE CASCADE,
          author_id TEXT NOT NULL REFERENCES users(id),
          text TEXT NOT NULL,
          created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS infrastructure_objects (
          id TEXT PRIMARY KEY,
          kind TEXT NOT NULL,
          latitude REAL NOT NULL,
          longitude REAL NOT NULL,
          condition TEXT NOT NULL DEFAULT 'unknown',
          name TEXT,
          inserted_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        );

        CREATE INDEX IF NOT EXISTS idx_infrastructure_lat ON infrastructure_objects(latitude);
        "#,
    )?;
    Ok(())
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

const USER_COLUMNS: &str =
    "id, email, full_name, phone, points, is_active, is_verified, chat_id, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        full_name: row.get(2)?,
        phone: row.get(3)?,
        points: row.get(4)?,
        is_active: row.get(5)?,
        is_verified: row.get(6)?,
        chat_id: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub fn create_user(conn: &Connection, user: &NewUser, now: OffsetDateTime) -> Result<User> {
    let email = user.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(CivicError::invalid_input("email", format!("{email:?} is not an address")).into());
    }
    if get_user_by_email(conn, &email)?.is_some() {
        return Err(CivicError::invalid_input("email", format!("{email} is already registered")).into());
    }

    let created = User {
        id: new_id(),
        email,
        full_name: user.full_name.clone(),
        phone: user.phone.clone(),
        points: 0,
        is_active: true,
        is_verified: false,
        chat_id: user.chat_id.clone(),
        created_at: format_timestamp(now)?,
    };
    conn.execute(
        r#"
        INSERT INTO users (id, email, full_name, phone, points, is_active, is_verified, chat_id, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            created.id,
            created.email,
            created.full_name,
            created.phone,
            created.points,
            created.is_active,
            created.is_verified,
            created.chat_id,
            created.created_at
        ],
    )?;
    info!(user_id = %created.id, "created user");
    Ok(created)
}

pub fn get_user(conn: &Connection, user_id: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![user_id],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![email.trim().to_lowercase()],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn count_users(conn: &Connection) -> Result<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(count as u64)
}

pub fn count_users_since(conn: &Connection, since: OffsetDateTime) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE created_at >= ?1",
        params![format_timestamp(since)?],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

fn anonymous_author(conn: &Connection, now: OffsetDateTime) -> Result<User> {
    if let Some(user) = get_user_by_email(conn, ANONYMOUS_EMAIL)? {
        return Ok(user);
    }
    create_user(
        conn,
        &NewUser {
            email: ANONYMOUS_EMAIL.to_string(),
            full_name: Some("Anonymous resident".to_string()),
            phone: None,
            chat_id: None,
        },
        now,
    )
}

const IDEA_COLUMNS: &str = r#"
    id, title, description, category, status, latitude, longitude, address,
    author_id, votes_count, comments_count, duplicate_count,
    importance_score, infrastructure_deficit, social_weight, priority,
    photo_urls_json, created_at, updated_at
"#;

#[derive(Debug)]
struct IdeaRow {
    id: String,
    title: String,
    description: String,
    category: String,
    status: String,
    latitude: f64,
    longitude: f64,
    address: Option<String>,
    author_id: String,
    votes_count: u32,
    comments_count: u32,
    duplicate_count: u32,
    importance_score: Option<f64>,
    infrastructure_deficit: Option<f64>,
    social_weight: Option<f64>,
    priority: Option<String>,
    photo_urls_json: String,
    created_at: String,
    updated_at: Option<String>,
}

impl IdeaRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(IdeaRow {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            category: row.get(3)?,
            status: row.get(4)?,
            latitude: row.get(5)?,
            longitude: row.get(6)?,
            address: row.get(7)?,
            author_id: row.get(8)?,
            votes_count: row.get(9)?,
            comments_count: row.get(10)?,
            duplicate_count: row.get(11)?,
            importance_score: row.get(12)?,
            infrastructure_deficit: row.get(13)?,
            social_weight: row.get(14)?,
            priority: row.get(15)?,
            photo_urls_json: row.get(16)?,
            created_at: row.get(17)?,
            updated_at: row.get(18)?,
        })
    }

    fn into_idea(self) -> Result<Idea> {
        let priority = self
            .priority
            .as_deref()
            .map(str::parse::<PriorityTier>)
            .transpose()?;
        Ok(Idea {
            category: self.category.parse()?,
            status: self.status.parse()?,
            location: Coordinate::new(self.latitude, self.longitude),
            photo_urls: serde_json::from_str(&self.photo_urls_json)?,
            priority,
            id: self.id,
            title: self.title,
            description: self.description,
            address: self.address,
            author_id: self.author_id,
            votes_count: self.votes_count,
            comments_count: self.comments_count,
            duplicate_count: self.duplicate_count,
            importance_score: self.importance_score,
            infrastructure_deficit: self.infrastructure_deficit,
            social_weight: self.social_weight,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn query_ideas(conn: &Connection, sql: &str, values: Vec<SqlValue>) -> Result<Vec<Idea>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(values), IdeaRow::from_row)?;
    let mut ideas = Vec::new();
    for r in rows {
        ideas.push(r?.into_idea()?);
    }
    Ok(ideas)
}

/// Stores a submission. Without an author the idea is filed under the shared
/// anonymous resident account.
pub fn create_idea(
    conn: &Connection,
    draft: &NewIdea,
    category: IdeaCategory,
    author_id: Option<&str>,
    now: OffsetDateTime,
) -> Result<Idea> {
    draft.validate()?;
    let author_id = match author_id {
        Some(id) => get_user(conn, id)?
            .ok_or_else(|| CivicError::NotFound {
                kind: "user",
                id: id.to_string(),
            })?
            .id,
        None => anonymous_author(conn, now)?.id,
    };

    let idea = Idea {
        id: new_id(),
        title: draft.title.trim().to_string(),
        description: draft.description.trim().to_string(),
        category,
        status: IdeaStatus::New,
        location: draft.location,
        address: draft.address.clone(),
        author_id,
        votes_count: 0,
        comments_count: 0,
        duplicate_count: 0,
        importance_score: None,
        infrastructure_deficit: None,
        social_weight: None,
        priority: None,
        photo_urls: draft.photo_urls.clone(),
        created_at: format_timestamp(now)?,
        updated_at: None,
    };

    conn.execute(
        r#"
        INSERT INTO ideas (
          id, title, description, category, status, latitude, longitude,
          address, author_id, photo_urls_json, created_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
        params![
            idea.id,
            idea.title,
            idea.description,
            idea.category.as_str(),
            idea.status.as_str(),
            idea.location.latitude,
            idea.location.longitude,
            idea.address,
            idea.author_id,
            serde_json::to_string(&idea.photo_urls)?,
            idea.created_at
        ],
    )?;
    info!(idea_id = %idea.id, category = %idea.category, "stored idea");
    Ok(idea)
}

pub fn get_idea(conn: &Connection, idea_id: &str) -> Result<Option<Idea>> {
    let row = conn
        .query_row(
            &format!("SELECT {IDEA_COLUMNS} FROM ideas WHERE id = ?1"),
            params![idea_id],
            IdeaRow::from_row,
        )
        .optional()?;
    row.map(IdeaRow::into_idea).transpose()
}

pub fn require_idea(conn: &Connection, idea_id: &str) -> Result<Idea> {
    get_idea(conn, idea_id)?.ok_or_else(|| {
        CivicError::NotFound {
            kind: "idea",
            id: idea_id.to_string(),
        }
        .into()
    })
}

#[derive(Debug, Clone)]
pub struct IdeaFilter {
    pub category: Option<IdeaCategory>,
    pub status: Option<IdeaStatus>,
    pub priority: Option<PriorityTier>,
    pub skip: usize,
    pub limit: usize,
}

impl Default for IdeaFilter {
    fn default() -> Self {
        Self {
            category: None,
            status: None,
            priority: None,
            skip: 0,
            limit: 50,
        }
    }
}

/// Filtered listing, most important first; unscored ideas sink to the end.
pub fn list_ideas(conn: &Connection, filter: &IdeaFilter) -> Result<Vec<Idea>> {
    let mut clauses = Vec::new();
    let mut values = Vec::new();
    if let Some(category) = filter.category {
        values.push(SqlValue::Text(category.as_str().to_string()));
        clauses.push(format!("category = ?{}", values.len()));
    }
    if let Some(status) = filter.status {
        values.push(SqlValue::Text(status.as_str().to_string()));
        clauses.push(format!("status = ?{}", values.len()));
    }
    if let Some(priority) = filter.priority {
        values.push(SqlValue::Text(priority.as_str().to_string()));
        clauses.push(format!("priority = ?{}", values.len()));
    }
    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    values.push(SqlValue::Integer(filter.limit as i64));
    let limit_idx = values.len();
    values.push(SqlValue::Integer(filter.skip as i64));
    let offset_idx = values.len();

    let sql = format!(
        "SELECT {IDEA_COLUMNS} FROM ideas {where_sql} \
         ORDER BY importance_score DESC NULLS LAST, created_at DESC \
         LIMIT ?{limit_idx} OFFSET ?{offset_idx}"
    );
    query_ideas(conn, &sql, values)
}

pub fn recent_ideas(conn: &Connection, limit: usize) -> Result<Vec<Idea>> {
    query_ideas(
        conn,
        &format!("SELECT {IDEA_COLUMNS} FROM ideas ORDER BY created_at DESC LIMIT ?1"),
        vec![SqlValue::Integer(limit as i64)],
    )
}

pub fn all_ideas(conn: &Connection) -> Result<Vec<Idea>> {
    query_ideas(
        conn,
        &format!("SELECT {IDEA_COLUMNS} FROM ideas ORDER BY created_at"),
        Vec::new(),
    )
}

/// Candidates for the duplicate factor: same category, newest first,
/// never the idea itself. Distance filtering happens in the scorer.
pub fn similar_ideas(conn: &Connection, idea: &Idea, limit: usize) -> Result<Vec<Idea>> {
    query_ideas(
        conn,
        &format!(
            "SELECT {IDEA_COLUMNS} FROM ideas \
             WHERE category = ?1 AND id != ?2 \
             ORDER BY created_at DESC LIMIT ?3"
        ),
        vec![
            SqlValue::Text(idea.category.as_str().to_string()),
            SqlValue::Text(idea.id.clone()),
            SqlValue::Integer(limit as i64),
        ],
    )
}

pub fn update_category(
    conn: &Connection,
    idea_id: &str,
    category: IdeaCategory,
    now: OffsetDateTime,
) -> Result<()> {
    let changed = conn.execute(
        "UPDATE ideas SET category = ?1, updated_at = ?2 WHERE id = ?3",
        params![category.as_str(), format_timestamp(now)?, idea_id],
    )?;
    if changed == 0 {
        return Err(CivicError::NotFound {
            kind: "idea",
            id: idea_id.to_string(),
        }
        .into());
    }
    Ok(())
}

pub fn update_status(
    conn: &Connection,
    idea_id: &str,
    next: IdeaStatus,
    moderation_override: bool,
    now: OffsetDateTime,
) -> Result<Idea> {
    let mut idea = require_idea(conn, idea_id)?;
    let status = idea.status.transition(next, moderation_override)?;
    let updated_at = format_timestamp(now)?;
    conn.execute(
        "UPDATE ideas SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), updated_at, idea_id],
    )?;
    info!(idea_id, from = %idea.status, to = %status, moderation_override, "status changed");
    idea.status = status;
    idea.updated_at = Some(updated_at);
    Ok(idea)
}

/// Writes the derived scores of a prioritization back onto the idea.
pub fn apply_priority(
    conn: &Connection,
    idea_id: &str,
    result: &PriorityResult,
    duplicate_count: u32,
    now: OffsetDateTime,
) -> Result<()> {
    let changed = conn.execute(
        r#"
        UPDATE ideas SET
          importance_score = ?1,
          infrastructure_deficit = ?2,
          social_weight = ?3,
          priority = ?4,
          duplicate_count = ?5,
          updated_at = ?6
        WHERE id = ?7
        "#,
        params![
            result.final_score,
            result.components.infrastructure_score,
            result.components.social_score,
            result.priority.as_str(),
            duplicate_count,
            format_timestamp(now)?,
            idea_id
        ],
    )?;
    if changed == 0 {
        return Err(CivicError::NotFound {
            kind: "idea",
            id: idea_id.to_string(),
        }
        .into());
    }
    debug!(idea_id, score = result.final_score, priority = %result.priority, "applied priority");
    Ok(())
}

/// Deletes an idea together with its votes and comments.
pub fn delete_idea(conn: &Connection, idea_id: &str) -> Result<bool> {
    let changed = conn.execute("DELETE FROM ideas WHERE id = ?1", params![idea_id])?;
    if changed > 0 {
        info!(idea_id, "deleted idea");
    }
    Ok(changed > 0)
}

/// Records one vote per (idea, voter) and bumps the idea's counter in the
/// same transaction.
pub fn cast_vote(
    conn: &Connection,
    idea_id: &str,
    voter_id: &str,
    direction: VoteDirection,
    now: OffsetDateTime,
) -> Result<Vote> {
    let tx = conn.unchecked_transaction()?;
    require_idea(&tx, idea_id)?;
    if get_user(&tx, voter_id)?.is_none() {
        return Err(CivicError::NotFound {
            kind: "user",
            id: voter_id.to_string(),
        }
        .into());
    }
    let existing: Option<String> = tx
        .query_row(
            "SELECT id FROM votes WHERE idea_id = ?1 AND voter_id = ?2",
            params![idea_id, voter_id],
            |row| row.get(0),
        )
        .optional()?;
    if existing.is_some() {
        return Err(CivicError::DuplicateVote {
            idea_id: idea_id.to_string(),
            voter_id: voter_id.to_string(),
        }
        .into());
    }

    let vote = Vote {
        id: new_id(),
        idea_id: idea_id.to_string(),
        voter_id: voter_id.to_string(),
        direction,
        created_at: format_timestamp(now)?,
    };
    tx.execute(
        "INSERT INTO votes (id, idea_id, voter_id, direction, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![vote.id, vote.idea_id, vote.voter_id, vote.direction.as_str(), vote.created_at],
    )?;
    tx.execute(
        "UPDATE ideas SET votes_count = votes_count + 1 WHERE id = ?1",
        params![idea_id],
    )?;
    tx.commit()?;
    info!(idea_id, voter_id, direction = %direction, "vote recorded");
    Ok(vote)
}

pub fn votes_for(conn: &Connection, idea_id: &str) -> Result<Vec<Vote>> {
    let mut stmt = conn.prepare(
        "SELECT id, idea_id, voter_id, direction, created_at FROM votes WHERE idea_id = ?1 ORDER BY created_at",
    )?;
    let rows = stmt.query_map(params![idea_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;
    let mut votes = Vec::new();
    for r in rows {
        let (id, idea_id, voter_id, direction, created_at) = r?;
        votes.push(Vote {
            id,
            idea_id,
            voter_id,
            direction: direction.parse()?,
            created_at,
        });
    }
    Ok(votes)
}

pub fn add_comment(
    conn: &Connection,
    idea_id: &str,
    author_id: &str,
    text: &str,
    now: OffsetDateTime,
) -> Result<Comment> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CivicError::invalid_input("text", "comment is empty").into());
    }
    let tx = conn.unchecked_transaction()?;
    require_idea(&tx, idea_id)?;
    if get_user(&tx, author_id)?.is_none() {
        return Err(CivicError::NotFound {
            kind: "user",
            id: author_id.to_string(),
        }
        .into());
    }
    let comment = Comment {
        id: new_id(),
        idea_id: idea_id.to_string(),
        author_id: author_id.to_string(),
        text: text.to_string(),
        created_at: format_timestamp(now)?,
    };
    tx.execute(
        "INSERT INTO comments (id, idea_id, author_id, text, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![comment.id, comment.idea_id, comment.author_id, comment.text, comment.created_at],
    )?;
    tx.execute(
        "UPDATE ideas SET comments_count = comments_count + 1 WHERE id = ?1",
        params![idea_id],
    )?;
    tx.commit()?;
    info!(idea_id, author_id, "comment added");
    Ok(comment)
}

pub fn comments_for(conn: &Connection, idea_id: &str) -> Result<Vec<Comment>> {
    let mut stmt = conn.prepare(
        "SELECT id, idea_id, author_id, text, created_at FROM comments WHERE idea_id = ?1 ORDER BY created_at",
    )?;
    let rows = stmt.query_map(params![idea_id], |row| {
        Ok(Comment {
            id: row.get(0)?,
            idea_id: row.get(1)?,
            author_id: row.get(2)?,
            text: row.get(3)?,
            created_at: row.get(4)?,
        })
    })?;
    let mut comments = Vec::new();
    for r in rows {
        comments.push(r?);
    }
    Ok(comments)
}

pub fn upsert_infrastructure(conn: &Connection, object: &InfrastructureObject) -> Result<()> {
    object.location.validate("location")?;
    conn.execute(
        r#"
        INSERT INTO infrastructure_objects (id, kind, latitude, longitude, condition, name)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(id) DO UPDATE SET
          kind=excluded.kind,
          latitude=excluded.latitude,
          longitude=excluded.longitude,
          condition=excluded.condition,
          name=excluded.name
        "#,
        params![
            object.id,
            object.kind,
            object.location.latitude,
            object.location.longitude,
            object.condition.as_str(),
            object.name
        ],
    )?;
    Ok(())
}

/// Objects within `radius_m` of `origin`. A latitude band narrows the scan,
/// exact distances are checked in memory.
pub fn infrastructure_within(
    conn: &Connection,
    origin: &Coordinate,
    radius_m: f64,
) -> Result<Vec<InfrastructureObject>> {
    let lat_delta = radius_m / METERS_PER_DEGREE;
    let mut stmt = conn.prepare(
        r#"
        SELECT id, kind, latitude, longitude, condition, name
        FROM infrastructure_objects
        WHERE latitude BETWEEN ?1 AND ?2
        ORDER BY id
        "#,
    )?;
    let rows = stmt.query_map(
        params![origin.latitude - lat_delta, origin.latitude + lat_delta],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        },
    )?;

    let mut objects = Vec::new();
    for r in rows {
        let (id, kind, latitude, longitude, condition, name) = r?;
        let location = Coordinate::new(latitude, longitude);
        if origin.distance_m(&location) > radius_m {
            continue;
        }
        objects.push(InfrastructureObject {
            id,
            kind,
            location,
            condition: condition.parse()?,
            name,
        });
    }
    Ok(objects)
}
