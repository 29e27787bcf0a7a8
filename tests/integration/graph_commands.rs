//! Command graph introspection from the shell.

use super::support::{dispatcher, run_all, sample_session};
use awsnet::shell::CommandOutput;
use tempfile::TempDir;

#[tokio::test]
async fn test_standard_graph_validates() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    let output = dispatcher
        .execute(&mut session, "validate_graph")
        .await
        .unwrap();
    match output {
        CommandOutput::Message { text } => {
            assert!(text.starts_with("Command graph OK: "), "{}", text);
            assert!(text.ends_with("all implemented"));
        }
        other => panic!("expected message, got {:?}", other),
    }
}

#[tokio::test]
async fn test_show_graph_reports_no_gaps() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    let output = dispatcher.execute(&mut session, "show graph").await.unwrap();
    let CommandOutput::Detail { fields, .. } = output else {
        panic!("expected detail");
    };
    let field = |name: &str| {
        fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .unwrap()
    };
    assert_eq!(field("unimplemented"), "0");
    assert_eq!(field("nodes"), dispatcher.graph().len().to_string());
    assert_eq!(field("fingerprint").len(), 64);
}

#[tokio::test]
async fn test_graph_commands_only_at_root() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    run_all(&dispatcher, &mut session, &["set vpc prod"]).await;
    let err = dispatcher
        .execute(&mut session, "validate_graph")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidTransition");
}

#[tokio::test]
async fn test_export_formats() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    let output = dispatcher.execute(&mut session, "export_graph").await.unwrap();
    match output {
        CommandOutput::Document { format, body } => {
            assert_eq!(format, "text");
            assert!(body.starts_with("root [root]\n"));
            assert!(body.contains("set vpc <selector> [context-entry]"));
        }
        other => panic!("expected document, got {:?}", other),
    }

    let output = dispatcher
        .execute(&mut session, "export_graph markdown")
        .await
        .unwrap();
    match output {
        CommandOutput::Document { format, body } => {
            assert_eq!(format, "markdown");
            assert!(body.starts_with("# Command graph\n"));
        }
        other => panic!("expected document, got {:?}", other),
    }

    let output = dispatcher
        .execute(&mut session, "export_graph mermaid")
        .await
        .unwrap();
    match output {
        CommandOutput::Document { body, .. } => {
            assert!(body.starts_with("flowchart TD\n"));
            assert_eq!(body.matches(" --> ").count(), dispatcher.graph().len() - 1);
        }
        other => panic!("expected document, got {:?}", other),
    }

    let err = dispatcher
        .execute(&mut session, "export_graph svg")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidArgument");
}

#[tokio::test]
async fn test_export_to_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graph.mmd");
    let dispatcher = dispatcher();
    let mut session = sample_session();

    let line = format!("export_graph mermaid {}", path.display());
    let output = dispatcher.execute(&mut session, &line).await.unwrap();
    assert_eq!(
        output,
        CommandOutput::message(format!("Wrote mermaid graph to {}", path.display()))
    );
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("flowchart TD\n"));
}
