//! Session options, `show config` and `write`.

use super::support::{dispatcher, run_all, sample_session};
use awsnet::shell::{CommandOutput, OutputFormat};
use tempfile::TempDir;

fn field<'a>(fields: &'a [(String, String)], name: &str) -> &'a str {
    fields
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
        .unwrap_or_else(|| panic!("no field {}", name))
}

#[tokio::test]
async fn test_show_config_reflects_set_options() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    run_all(
        &dispatcher,
        &mut session,
        &[
            "set profile prod",
            "set regions us-east-1,EU-WEST-1",
            "set output-format json",
            "set watch 5",
        ],
    )
    .await;
    assert_eq!(session.options.output_format, OutputFormat::Json);

    let output = dispatcher.execute(&mut session, "show config").await.unwrap();
    let CommandOutput::Detail { fields, .. } = output else {
        panic!("expected detail");
    };
    assert_eq!(field(&fields, "profile"), "prod");
    assert_eq!(field(&fields, "regions"), "us-east-1,eu-west-1");
    assert_eq!(field(&fields, "output-format"), "json");
    assert_eq!(field(&fields, "watch"), "5s");
    assert_eq!(field(&fields, "cache-ttl"), "15m");
    assert_eq!(field(&fields, "no-cache"), "off");
}

#[tokio::test]
async fn test_running_config_includes_context_path() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    run_all(&dispatcher, &mut session, &["set vpc prod"]).await;
    let output = dispatcher
        .execute(&mut session, "show running-config")
        .await
        .unwrap();
    let CommandOutput::Sections { sections } = output else {
        panic!("expected sections");
    };
    match &sections[1] {
        CommandOutput::Detail { fields, .. } => {
            assert_eq!(field(fields, "path"), "vpc:prod");
            assert_eq!(field(fields, "depth"), "1");
        }
        other => panic!("expected detail, got {:?}", other),
    }
    assert!(matches!(&sections[2], CommandOutput::Document { format, .. } if format == "toml"));
}

#[tokio::test]
async fn test_invalid_option_values_are_rejected() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    for line in [
        "set regions not_a_region!",
        "set no-cache maybe",
        "set output-format xml",
        "set watch 0",
        "set cache-ttl 5y",
    ] {
        let err = dispatcher.execute(&mut session, line).await.unwrap_err();
        assert_eq!(err.kind(), "InvalidArgument", "{}", line);
    }
    assert_eq!(session.options, Default::default());
}

#[tokio::test]
async fn test_write_saves_last_data_output() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vpcs.txt");
    let dispatcher = dispatcher();
    let mut session = sample_session();

    let line = format!("write {}", path.display());
    let err = dispatcher.execute(&mut session, &line).await.unwrap_err();
    assert_eq!(err.kind(), "NotFound");

    run_all(&dispatcher, &mut session, &["show vpcs", "set output-format json"]).await;
    dispatcher.execute(&mut session, &line).await.unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("vpc-0a1"));
    assert!(written.contains("\"records\""));
}
