use litebrowse_adapters::sqlite::SqliteStore;
use litebrowse_core::store::QueryOutcome;

#[test]
fn fresh_users_table_end_to_end() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("browse.sqlite");

    let store = SqliteStore::open(&path).expect("database file should open");
    store
        .execute_batch(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);\
             INSERT INTO users (id, name) VALUES (1, 'Kevin'), (2, 'Mike'), (3, 'Brandon');",
        )
        .expect("schema setup should succeed");

    let tables = store.list_tables().expect("listing should succeed");
    assert_eq!(tables, vec!["users".to_string()]);

    let columns = store.describe_table("users").expect("describe should succeed");
    assert_eq!(columns.len(), 2);
    assert!(columns[0].primary_key);
    assert_eq!(columns[0].name, "id");
    assert!(!columns[1].primary_key);

    // Without an explicit ORDER BY insertion order is what SQLite happens to
    // return for a rowid table; observed, not guaranteed.
    let page = store.list_page("users", 10, 0).expect("page should load");
    assert_eq!(
        page.rows,
        vec![
            vec!["1".to_string(), "Kevin".to_string()],
            vec!["2".to_string(), "Mike".to_string()],
            vec!["3".to_string(), "Brandon".to_string()],
        ]
    );

    // Edit one row through the full update path and read it back.
    let edited = vec!["2".to_string(), "Michael".to_string()];
    store
        .update_row("users", &columns, &edited)
        .expect("update should succeed");

    let outcome = store
        .execute("SELECT name FROM users WHERE id = 2")
        .expect("ad-hoc read should succeed");
    match outcome {
        QueryOutcome::Rows(grid) => {
            assert_eq!(grid.rows, vec![vec!["Michael".to_string()]]);
        }
        QueryOutcome::Mutation { .. } => panic!("SELECT must yield rows"),
    }

    store.close().expect("close should succeed");

    // The edit must have reached the file, not just the open connection.
    let reopened = SqliteStore::open(&path).expect("database file should reopen");
    let page = reopened.list_page("users", 10, 0).expect("page should load");
    assert_eq!(page.rows[1][1], "Michael");
    reopened.close().expect("close should succeed");
}

#[test]
fn seeded_database_is_browsable() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("seeded.sqlite");

    let store = SqliteStore::open(&path).expect("database file should open");
    litebrowse_adapters::seed::seed_demo(&store).expect("seed should succeed");

    let info = store.database_info().expect("info should succeed");
    let table_count = info
        .iter()
        .find(|(key, _)| key == "Tables")
        .map(|(_, value)| value.clone());
    assert_eq!(table_count, Some("4".to_string()));

    let matches = store
        .search("users", "alice", 50, 0)
        .expect("search should succeed");
    assert_eq!(matches.rows.len(), 1);
    assert_eq!(matches.rows[0][1], "asmith");

    store.close().expect("close should succeed");
}
