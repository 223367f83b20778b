//! Integration tests for events

#[cfg(test)]
mod tests {
    use pnlog_events::*;
    use pnlog_types::{DependencyType, LogLevel, LoggedPkg};
    use serde_json::json;

    #[tokio::test]
    async fn test_emitter_on_raw_sender() {
        let (tx, mut rx) = channel();

        tx.emit(LogRecord::new(
            LogLevel::Error,
            ProgressMessage::request(LoggedPkg::root("left-pad", "1.3.0"), RequestStatus::Error),
        ));
        tx.emit(LogRecord::new(LogLevel::Debug, BaseMessage::new("hello")));

        let event1 = rx.recv().await.unwrap();
        assert!(matches!(event1.event, LogEvent::Progress(_)));
        assert_eq!(event1.tracing_level(), tracing::Level::ERROR);

        let event2 = rx.recv().await.unwrap();
        assert!(matches!(event2.event, LogEvent::Base(_)));
        assert_eq!(event2.log_target(), "pnlog::events::base");
    }

    #[test]
    fn test_record_serializes_as_envelope() {
        let record = LogRecord::new(
            LogLevel::Info,
            RootMessage::added("lodash", "4.17.0", DependencyType::Dev),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            json!({
                "name": "pnpm:root",
                "level": "info",
                "added": {"name": "lodash", "version": "4.17.0", "dependencyType": "dev"},
            })
        );
    }

    #[test]
    fn test_validate_every_family_accepts_its_own_encoding() {
        let samples: Vec<LogEvent> = vec![
            BaseMessage::new("starting").into(),
            ProgressMessage::downloaded_manifest("registry/a/1.0.0", "1.0.0").into(),
            LifecycleMessage::line("registry/a/1.0.0", "postinstall", "ok").into(),
            InstallCheckMessage::new("ENOTSUP", "registry/fsevents/2.3.3").into(),
            DeprecationMessage {
                pkg_name: "request".into(),
                pkg_version: "2.88.2".into(),
                pkg_id: "registry/request/2.88.2".into(),
                deprecated: "request has been deprecated".into(),
                depth: 2,
            }
            .into(),
            StageMessage::ResolutionDone.into(),
            StandardMessage::new("using registry https://registry.npmjs.org/").into(),
            RootMessage::removed("lodash", Some("4.17.0".into()), DependencyType::Prod).into(),
            SummaryMessage.into(),
        ];

        for event in samples {
            let mut fields = Fields::new();
            event.write_fields(&mut fields);
            assert!(validate(event.name(), &fields).is_ok(), "{event:?}");
            assert_eq!(read_event(event.name(), fields).unwrap(), event);
        }
    }
}
