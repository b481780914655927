use std::io::Write;

use moderation_relay::config::{GlobalConfig, TelegramDelivery};
use moderation_relay::AppError;

fn minimal_toml() -> String {
    r#"
[messenger]
page_id = "1234567890"

[telegram]
chat_id = -1001234567890
"#
    .to_owned()
}

fn full_toml() -> String {
    r##"
http_host = "127.0.0.1"
http_port = 9000
done_retention_seconds = 600

[messenger]
page_id = "1234567890"
graph_api_version = "v19.0"
request_timeout_seconds = 10

[telegram]
chat_id = -1001234567890
delivery = "webhook"
webhook_url = "https://relay.example.com/telegram/webhook"
authorized_user_ids = [11, 22]
poll_timeout_seconds = 50

[intake]
trigger_word = "post"
finish_keyword = "done"
dedup_capacity = 40
dedup_retain = 20

[announce]
batch_size = 5

[publish]
date_label = "Date"
location_label = "Place"
body = ""
hashtags = ["#green"]

[messages]
welcome = "مرحبًا"
"##
    .to_owned()
}

fn expect_config_error(raw: &str, fragment: &str) {
    match GlobalConfig::from_toml_str(raw) {
        Err(AppError::Config(msg)) => assert!(msg.contains(fragment), "unexpected message: {msg}"),
        other => panic!("expected config error containing {fragment:?}, got {other:?}"),
    }
}

#[test]
fn minimal_config_uses_defaults() {
    let config = GlobalConfig::from_toml_str(&minimal_toml()).expect("config parses");

    assert_eq!(config.http_host, "0.0.0.0");
    assert_eq!(config.http_port, 8000);
    assert_eq!(config.done_retention_seconds, 86_400);
    assert_eq!(config.messenger.graph_api_base, "https://graph.facebook.com");
    assert_eq!(config.messenger.graph_api_version, "v17.0");
    assert_eq!(config.telegram.delivery, TelegramDelivery::Poll);
    assert!(config.telegram.authorized_user_ids.is_empty());
    assert_eq!(config.intake.trigger_word, "samir");
    assert_eq!(config.intake.finish_keyword, "fin");
    assert_eq!(config.intake.dedup_capacity, 30);
    assert_eq!(config.intake.dedup_retain, 15);
    assert_eq!(config.announce.batch_size, 10);
    assert_eq!(config.publish.hashtags.len(), 2);
    assert!(config.messenger.page_access_token.is_empty());
}

#[test]
fn full_config_overrides_every_section() {
    let config = GlobalConfig::from_toml_str(&full_toml()).expect("config parses");

    assert_eq!(config.http_port, 9000);
    assert_eq!(config.done_retention_seconds, 600);
    assert_eq!(config.messenger.graph_api_version, "v19.0");
    assert_eq!(config.telegram.delivery, TelegramDelivery::Webhook);
    assert_eq!(config.telegram.poll_timeout_seconds, 50);
    assert_eq!(config.intake.trigger_word, "post");
    assert_eq!(config.announce.batch_size, 5);
    assert_eq!(config.publish.hashtags, vec!["#green".to_owned()]);
    assert_eq!(config.messages.welcome, "مرحبًا");
    // Unlisted texts keep their defaults.
    assert_eq!(config.messages.finish_ok, moderation_relay::config::Messages::default().finish_ok);
}

#[test]
fn authorized_users_restrict_moderation() {
    let open = GlobalConfig::from_toml_str(&minimal_toml()).expect("config parses");
    let restricted = GlobalConfig::from_toml_str(&full_toml()).expect("config parses");

    assert!(open.is_moderator(99));
    assert!(restricted.is_moderator(22));
    assert!(!restricted.is_moderator(99));
}

#[test]
fn webhook_delivery_requires_url() {
    let raw = minimal_toml().replace(
        "chat_id = -1001234567890",
        "chat_id = -1001234567890\ndelivery = \"webhook\"",
    );
    expect_config_error(&raw, "webhook_url");
}

#[test]
fn empty_page_id_is_rejected() {
    let raw = minimal_toml().replace("\"1234567890\"", "\"  \"");
    expect_config_error(&raw, "page_id");
}

#[test]
fn missing_chat_is_rejected() {
    let raw = minimal_toml().replace("-1001234567890", "0");
    expect_config_error(&raw, "chat_id");
}

#[test]
fn dedup_retain_must_be_below_capacity() {
    let raw = format!("{}\n[intake]\ndedup_capacity = 10\ndedup_retain = 10\n", minimal_toml());
    expect_config_error(&raw, "dedup_retain");
}

#[test]
fn batch_size_must_fit_a_media_group() {
    for size in [1, 11] {
        let raw = format!("{}\n[announce]\nbatch_size = {size}\n", minimal_toml());
        expect_config_error(&raw, "batch_size");
    }
}

#[test]
fn invalid_toml_maps_to_config_error() {
    expect_config_error("[messenger\npage_id = 1", "invalid config");
}

#[test]
fn load_from_path_reads_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(minimal_toml().as_bytes()).expect("write config");

    let config = GlobalConfig::load_from_path(file.path()).expect("config loads");
    assert_eq!(config.messenger.page_id, "1234567890");
}

#[test]
fn load_from_missing_path_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = GlobalConfig::load_from_path(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn shipped_example_config_parses() {
    let config = GlobalConfig::from_toml_str(include_str!("../../config.example.toml"))
        .expect("example config parses");
    assert_eq!(config.messages.button_delete_photo_n, "Supprimer photo {n}");
}
