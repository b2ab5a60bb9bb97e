use std::path::PathBuf;

use mudline::{
    Error, History, HistoryConfig, HistoryStore, MemoryStore, Result, SqliteStore,
};

/// Store whose writes and queries always fail, for exercising the
/// degrade-not-fail path.
struct FailingStore;

impl HistoryStore for FailingStore {
    fn insert(&mut self, _text: &str, _ts_ms: i64, _session_id: Option<&str>) -> Result<()> {
        Err(Error::Schema("store offline".to_string()))
    }

    fn recent(&self, _limit: usize) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn search_substring(&self, _pattern: &str, _limit: usize) -> Result<Vec<String>> {
        Err(Error::Schema("store offline".to_string()))
    }
}

fn db_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("characters").join("tester").join("history.db")
}

fn open_history(path: &PathBuf) -> History {
    History::with_store(Box::new(SqliteStore::open(path).unwrap()))
}

#[test]
fn history_survives_reopen() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = db_path(&dir);

    let mut history = open_history(&path);
    history.add("look");
    history.add("north");
    history.add("kill goblin");
    drop(history);

    let mut reopened = open_history(&path);
    assert_eq!(reopened.entries(), vec!["look", "north", "kill goblin"]);
    assert_eq!(reopened.next(), None);
    assert_eq!(reopened.previous(), Some("kill goblin"));
}

#[test]
fn hydration_respects_limit() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = db_path(&dir);

    let mut history = open_history(&path);
    for command in ["one", "two", "three", "four", "five"] {
        history.add(command);
    }
    drop(history);

    let config = HistoryConfig {
        hydrate_limit: 2,
        session_id: None,
    };
    let reopened = History::with_config(Box::new(SqliteStore::open(&path).unwrap()), config);
    assert_eq!(reopened.entries(), vec!["four", "five"]);
}

#[test]
fn adjacent_duplicates_are_not_persisted() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = db_path(&dir);

    let mut history = open_history(&path);
    history.add("look");
    history.add("look");
    history.add("north");
    history.add("look");
    drop(history);

    let reopened = open_history(&path);
    assert_eq!(reopened.entries(), vec!["look", "north", "look"]);
}

#[test]
fn search_deep_reaches_beyond_hydrated_window() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = db_path(&dir);

    let mut history = open_history(&path);
    for command in ["kill goblin", "north", "look", "say hi", "drink potion"] {
        history.add(command);
    }
    drop(history);

    let config = HistoryConfig {
        hydrate_limit: 2,
        session_id: None,
    };
    let reopened = History::with_config(Box::new(SqliteStore::open(&path).unwrap()), config);

    // The in-memory tier no longer holds the match, the durable tier does.
    assert!(reopened.search("kill").is_empty());
    assert_eq!(reopened.search_deep("kill", 10), vec!["kill goblin"]);
}

#[test]
fn search_deep_is_distinct_and_newest_first() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = db_path(&dir);

    let mut history = open_history(&path);
    for command in ["kill goblin", "north", "kill goblin", "kill orc"] {
        history.add(command);
    }

    assert_eq!(
        history.search_deep("kill", 10),
        vec!["kill orc", "kill goblin"]
    );
    assert_eq!(history.search_deep("kill", 1), vec!["kill orc"]);
}

#[test]
fn search_deep_is_case_insensitive() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = db_path(&dir);

    let mut history = open_history(&path);
    history.add("Kill Goblin");

    assert_eq!(history.search_deep("kill", 10), vec!["Kill Goblin"]);
}

#[test]
fn search_deep_matches_like_metacharacters_literally() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = db_path(&dir);

    let mut history = open_history(&path);
    history.add("sell 100% of loot");
    history.add("kill goblin");

    assert_eq!(history.search_deep("100%", 10), vec!["sell 100% of loot"]);
    // "_" must not act as a single-character wildcard.
    assert!(history.search_deep("k_ll", 10).is_empty());
}

#[test]
fn search_deep_falls_back_to_memory_without_store() {
    let mut history = History::new();
    history.add("kill goblin");
    history.add("north");

    assert_eq!(history.search_deep("kill", 10), vec!["kill goblin"]);
}

#[test]
fn search_deep_falls_back_when_store_queries_fail() {
    let mut history = History::with_store(Box::new(FailingStore));
    history.add("kill goblin");

    assert_eq!(history.search_deep("kill", 10), vec!["kill goblin"]);
}

#[test]
fn write_failures_are_swallowed_and_counted() {
    let mut history = History::with_store(Box::new(FailingStore));
    history.add("look");
    history.add("north");
    // Suppressed duplicate never reaches the store, so no new drop.
    history.add("north");

    assert_eq!(history.entries(), vec!["look", "north"]);
    assert_eq!(history.dropped_writes(), 2);
}

#[test]
fn close_is_idempotent_and_log_stays_usable() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = db_path(&dir);

    let mut history = open_history(&path);
    history.add("look");
    history.close();
    history.close();
    history.add("north");

    assert_eq!(history.entries(), vec!["look", "north"]);
    assert_eq!(history.dropped_writes(), 0);

    // The entry added after close never reached the durable tier.
    let reopened = open_history(&path);
    assert_eq!(reopened.entries(), vec!["look"]);
}

#[test]
fn session_id_is_recorded_with_each_row() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = db_path(&dir);

    let config = HistoryConfig {
        hydrate_limit: 100,
        session_id: Some("alpha".to_string()),
    };
    let mut history = History::with_config(Box::new(SqliteStore::open(&path).unwrap()), config);
    history.add("look");
    drop(history);

    let conn = rusqlite::Connection::open(&path).unwrap();
    let session: Option<String> = conn
        .query_row("SELECT session_id FROM history WHERE command = 'look'", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(session.as_deref(), Some("alpha"));
}

#[test]
fn schema_init_is_idempotent() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = db_path(&dir);

    let store = SqliteStore::open(&path).unwrap();
    drop(store);
    SqliteStore::open(&path).unwrap();
}

#[test]
fn schema_version_mismatch_is_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = db_path(&dir);

    drop(SqliteStore::open(&path).unwrap());

    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute(
        "UPDATE history_metadata SET value = '999' WHERE key = 'schema_version'",
        [],
    )
    .unwrap();
    drop(conn);

    assert!(matches!(SqliteStore::open(&path), Err(Error::Schema(_))));
}

#[test]
fn in_memory_sqlite_store_works_without_a_path() {
    let mut history = History::with_store(Box::new(SqliteStore::open_in_memory().unwrap()));
    history.add("look");
    history.add("look around");

    assert_eq!(
        history.search_deep("look", mudline::history::DEFAULT_DEEP_SEARCH_LIMIT),
        vec!["look around", "look"]
    );
}

#[test]
fn character_history_path_is_per_character() {
    if let Some(path) = mudline::character_history_path("alric") {
        let path = path.to_string_lossy();
        assert!(path.ends_with("history.db"));
        assert!(path.contains("characters"));
        assert!(path.contains("alric"));
    }
}

#[test]
fn memory_store_honors_the_port_contract() {
    let mut store = MemoryStore::new();
    store.insert("kill goblin", 1, Some("s1")).unwrap();
    store.insert("north", 2, Some("s1")).unwrap();
    store.insert("kill goblin", 3, Some("s1")).unwrap();
    store.insert("kill orc", 4, Some("s1")).unwrap();

    assert_eq!(store.recent(2).unwrap(), vec!["kill orc", "kill goblin"]);
    assert_eq!(
        store.search_substring("KILL", 10).unwrap(),
        vec!["kill orc", "kill goblin"]
    );
    assert_eq!(store.search_substring("kill", 1).unwrap(), vec!["kill orc"]);
    assert_eq!(store.entries()[0].session_id.as_deref(), Some("s1"));
}

#[test]
fn memory_store_backs_a_history_like_the_real_adapter() {
    let mut seed = MemoryStore::new();
    seed.insert("look", 1, None).unwrap();
    seed.insert("north", 2, None).unwrap();

    let mut history = History::with_store(Box::new(seed));
    assert_eq!(history.entries(), vec!["look", "north"]);
    assert_eq!(history.previous(), Some("north"));
}
