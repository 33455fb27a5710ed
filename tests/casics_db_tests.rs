use casics_common::config::Config;
use casics_common::credentials::{
    PartialCredentials, ScriptedPrompter, SecretStore, SqliteKeyring,
};
use casics_common::db::{CasicsDb, Content, Fork, Probe, RepoEntry, make_content_type, make_languages};
use casics_common::path::generate_path;
use casics_common::timestamps::canonicalize_timestamp;

#[tokio::test]
async fn keyring_credentials_open_database_and_store_entries() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = tmp.path().to_path_buf();
    let keyring_url = format!("sqlite:{}", dir.join("keyring.sqlite").display());
    let cfg = Config {
        data_dir: dir.clone(),
        keyring_url: keyring_url.clone(),
        ..Config::default()
    };

    // First session prompts and saves to the keyring file.
    let keyring = SqliteKeyring::connect(&keyring_url).await.expect("keyring");
    let prompter = ScriptedPrompter::new(["db.casics.org", "", "casics", "secret"]);
    let mut db = CasicsDb::connect(
        &keyring,
        &prompter,
        &PartialCredentials::default(),
        &cfg,
        true,
        false,
    )
    .await
    .expect("connect");
    assert_eq!(db.credentials().port, 27017);

    let repos = db.open("github").await.expect("open github");
    let mut entry = RepoEntry::new(7182480).with_path("casics", "common");
    entry.languages = make_languages(["Python"]);
    entry.content_type = vec![make_content_type(Content::Code, None)];
    entry.fork = Fork::from_flags(Some(false), None, None);
    entry.time.repo_created = Some(canonicalize_timestamp("2012-07-20T01:19:13Z").unwrap());
    repos.upsert(&entry).await.expect("upsert");
    db.close().await;

    // A second session reads everything back without asking anything.
    drop(keyring);
    let keyring = SqliteKeyring::connect(&keyring_url).await.expect("reopen keyring");
    assert_eq!(
        keyring
            .get(&cfg.keyring_name, "host")
            .await
            .unwrap()
            .as_deref(),
        Some("db.casics.org")
    );
    let silent = ScriptedPrompter::new(Vec::<String>::new());
    let mut db = CasicsDb::connect(
        &keyring,
        &silent,
        &PartialCredentials::default(),
        &cfg,
        true,
        true,
    )
    .await
    .expect("reconnect");
    assert!(silent.asked().is_empty());

    let repos = db.open("github").await.expect("reopen github");
    let got = repos
        .get_by_id(7182480)
        .await
        .expect("query")
        .expect("entry stored");
    assert_eq!(got, entry);
    assert_eq!(got.language_names(), Probe::Found(vec!["Python".to_string()]));
    assert_eq!(
        generate_path(&dir, got.id).unwrap(),
        dir.join("07").join("18").join("24").join("80")
    );
    db.close().await;
}
