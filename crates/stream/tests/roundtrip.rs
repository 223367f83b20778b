//! decode(encode(record)) == record for every family

use chrono::DateTime;
use pnlog_events::{
    to_line, BaseMessage, DeprecationMessage, InstallCheckMessage, LifecycleMessage,
    LogEvent, LogRecord, PkgMilestone, ProgressMessage, RecordMeta, RequestStatus, RootMessage,
    StageMessage, StandardMessage, SummaryMessage,
};
use pnlog_stream::{decode_record, DecodeOptions};
use pnlog_types::{DependencyType, LogLevel, LoggedPkg};
use proptest::prelude::*;
use serde_json::Value;

fn text() -> impl Strategy<Value = String> {
    ".{0,24}"
}

fn logged_pkg() -> impl Strategy<Value = LoggedPkg> {
    (text(), text(), proptest::option::of(text())).prop_map(|(raw_spec, name, dependent_id)| {
        LoggedPkg {
            raw_spec,
            name,
            dependent_id,
        }
    })
}

fn dependency_type() -> impl Strategy<Value = DependencyType> {
    prop_oneof![
        Just(DependencyType::Prod),
        Just(DependencyType::Dev),
        Just(DependencyType::Optional),
    ]
}

fn progress() -> impl Strategy<Value = ProgressMessage> {
    let milestone = prop_oneof![
        Just(PkgMilestone::Fetched),
        Just(PkgMilestone::Installed),
        Just(PkgMilestone::DependenciesInstalled),
        Just(PkgMilestone::FoundInStore),
        Just(PkgMilestone::ResolvingContent),
    ];
    let request = prop_oneof![
        Just(RequestStatus::Resolving),
        Just(RequestStatus::Error),
        Just(RequestStatus::Installing),
    ];
    prop_oneof![
        (text(), milestone).prop_map(|(id, status)| ProgressMessage::milestone(id, status)),
        (text(), logged_pkg()).prop_map(|(id, pkg)| ProgressMessage::resolved(id, pkg)),
        (logged_pkg(), request).prop_map(|(pkg, status)| ProgressMessage::request(pkg, status)),
        (text(), proptest::option::of(any::<u64>()), any::<u32>())
            .prop_map(|(id, size, attempt)| ProgressMessage::fetching_started(id, size, attempt)),
        (text(), any::<u64>()).prop_map(|(id, n)| ProgressMessage::fetching_progress(id, n)),
        (text(), text()).prop_map(|(id, v)| ProgressMessage::downloaded_manifest(id, v)),
    ]
}

fn event() -> impl Strategy<Value = LogEvent> {
    let key = prop_oneof![
        "[a-zA-Z_]{1,10}",
        Just("message".to_string()),
        Just("name".to_string()),
        Just("level".to_string()),
        Just("time".to_string()),
        Just("hostname".to_string()),
        Just("pid".to_string()),
    ];
    let value = prop_oneof![
        text().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        Just(Value::Null),
    ];
    let base = (
        proptest::option::of(text()),
        proptest::collection::vec((key, value), 0..4),
    )
        .prop_map(|(message, extra)| {
            let start = message.map_or_else(BaseMessage::empty, BaseMessage::new);
            // reserved keys are refused; the rest accumulate
            let message = extra.into_iter().fold(start, |message, (key, value)| {
                message.clone().with_field(key, value).unwrap_or(message)
            });
            LogEvent::Base(message)
        });
    let lifecycle = prop_oneof![
        (text(), text(), text()).prop_map(|(id, script, line)| LifecycleMessage::line(id, script, line)),
        (text(), text(), any::<i32>()).prop_map(|(id, script, code)| LifecycleMessage::exit(id, script, code)),
    ];
    let root = prop_oneof![
        (text(), text(), dependency_type())
            .prop_map(|(name, version, kind)| RootMessage::added(name, version, kind)),
        (text(), proptest::option::of(text()), dependency_type())
            .prop_map(|(name, version, kind)| RootMessage::removed(name, version, kind)),
    ];
    let deprecation = (text(), text(), text(), text(), any::<u64>()).prop_map(
        |(pkg_name, pkg_version, pkg_id, deprecated, depth)| DeprecationMessage {
            pkg_name,
            pkg_version,
            pkg_id,
            deprecated,
            depth,
        },
    );
    prop_oneof![
        base,
        progress().prop_map(LogEvent::from),
        lifecycle.prop_map(LogEvent::from),
        (text(), text()).prop_map(|(code, id)| LogEvent::from(InstallCheckMessage::new(code, id))),
        deprecation.prop_map(LogEvent::from),
        Just(LogEvent::Stage(StageMessage::ResolutionDone)),
        text().prop_map(|message| LogEvent::from(StandardMessage::new(message))),
        root.prop_map(LogEvent::from),
        Just(LogEvent::Summary(SummaryMessage)),
    ]
}

fn meta() -> impl Strategy<Value = RecordMeta> {
    (
        proptest::option::of(0_i64..4_102_444_800_000),
        proptest::option::of("[a-z0-9-]{1,12}"),
        proptest::option::of(any::<u32>()),
    )
        .prop_map(|(millis, hostname, pid)| {
            let mut meta = RecordMeta::default();
            if let Some(time) = millis.and_then(DateTime::from_timestamp_millis) {
                meta = meta.with_time(time).unwrap();
            }
            meta.hostname = hostname;
            meta.pid = pid;
            meta
        })
}

fn level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
    ]
}

proptest! {
    #[test]
    fn decode_inverts_encode(level in level(), event in event(), meta in meta()) {
        let record = LogRecord { level, event, meta };
        let line = to_line(&record).unwrap();
        let decoded = decode_record(1, line.as_bytes(), &DecodeOptions::default());
        prop_assert_eq!(decoded, Ok(record));
    }
}
