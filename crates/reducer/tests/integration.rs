//! Integration tests for the run reducer

#[cfg(test)]
mod tests {
    use pnlog_events::ProgressStatus;
    use pnlog_reducer::*;
    use pnlog_stream::decode;

    #[test]
    fn test_fetch_scenario_closes_at_half_progress() {
        let input = [
            r#"{"name":"pnpm:progress","level":"info","status":"fetching_started","pkgId":"pkg-a","size":1024,"attempt":1}"#,
            r#"{"name":"pnpm:progress","level":"info","status":"fetching_progress","pkgId":"pkg-a","downloaded":512}"#,
            r#"{"name":"pnpm:summary","level":"info"}"#,
        ];
        let state = RunState::fold(decode(input));

        let package = state.package("pkg-a").unwrap();
        assert_eq!(package.downloaded, 512);
        assert_eq!(package.size, Some(1024));
        assert_eq!(package.fraction(), Some(0.5));
        assert_eq!(package.status, Some(ProgressStatus::FetchingProgress));
        assert!(state.is_finished());
        assert!(state.anomalies().is_empty());

        let summary = state.summary();
        assert_eq!(summary.records, 3);
        assert_eq!(summary.totals.expected_bytes, 1024);
        assert_eq!(summary.totals.downloaded_bytes, 512);
        assert!(summary.is_clean());
    }

    #[test]
    fn test_bad_records_do_not_stop_the_fold() {
        let input = [
            r#"{"name":"pnpm:stage","level":"debug","message":"resolution_done"}"#,
            "garbage",
            r#"{"name":"pnpm:mystery","level":"info"}"#,
            r#"{"name":"pnpm:lifecycle","level":"info","pkgId":"a","script":"install"}"#,
            r#"{"name":"pnpm:summary","level":"info"}"#,
        ];
        let state = RunState::fold(decode(input));

        assert!(state.resolution_done());
        assert!(state.is_finished());
        assert_eq!(
            state.decode_errors(),
            DecodeErrorCounts {
                malformed_record: 1,
                unknown_event_name: 1,
                schema_violation: 1,
            }
        );
        assert_eq!(state.records(), 2);
    }

    #[test]
    fn test_summary_serializes() {
        let input = [
            r#"{"name":"pnpm:progress","level":"debug","status":"resolving","pkg":{"rawSpec":"^1","name":"a"}}"#,
            r#"{"name":"pnpm:progress","level":"debug","status":"resolved","pkgId":"a@1.0.0","pkg":{"rawSpec":"^1","name":"a"}}"#,
            r#"{"name":"pnpm:root","level":"info","added":{"name":"a","version":"1.0.0","dependencyType":"prod"}}"#,
            r#"{"name":"pnpm:progress","level":"debug","status":"fetching_progress","pkgId":"b@2.0.0","downloaded":7}"#,
        ];
        let summary = RunState::fold(decode(input)).summary();
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["finished"], false);
        assert_eq!(json["requests"][0]["pkgId"], "a@1.0.0");
        assert_eq!(json["requests"][0]["pkg"]["rawSpec"], "^1");
        assert_eq!(json["added"][0]["dependencyType"], "prod");
        assert_eq!(json["packages"][1]["pkgId"], "b@2.0.0");
        assert_eq!(json["packages"][1]["untracked"], true);
        assert_eq!(json["anomalies"][0]["kind"], "progress_without_start");
        assert_eq!(json["anomalies"][0]["pkgId"], "b@2.0.0");
        assert_eq!(json["totals"]["downloadedBytes"], 7);
        assert_eq!(json["decodeErrors"]["malformedRecord"], 0);
        assert_eq!(json["resolutionDone"], false);
        assert!(snake_case_keys(&json).is_empty(), "{:?}", snake_case_keys(&json));
    }

    fn snake_case_keys(value: &serde_json::Value) -> Vec<String> {
        match value {
            serde_json::Value::Object(map) => map
                .iter()
                .flat_map(|(key, nested)| {
                    let mut found = snake_case_keys(nested);
                    if key.contains('_') {
                        found.push(key.clone());
                    }
                    found
                })
                .collect(),
            serde_json::Value::Array(items) => items.iter().flat_map(snake_case_keys).collect(),
            _ => Vec::new(),
        }
    }
}
