fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use blobbridge_protocol::{
        ChannelMessage, ChunkRecord, ErrorRecord, FinishRecord, StartRecord, decode_chunk,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn load_text(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        serde_json::from_str(&load_text(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    /// Parses a fixture as a channel record, re-serializes it, and compares
    /// the JSON values (order-independent).
    fn roundtrip_test(name: &str) -> ChannelMessage {
        let fixture = load_fixture(name);
        let parsed = ChannelMessage::parse(&load_text(name))
            .unwrap_or_else(|e| panic!("failed to parse record {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  Rust:    {reserialized}"
        );
        parsed
    }

    /// Checks that a payload struct alone carries every field except the tag.
    fn payload_matches<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let mut fixture = load_fixture(name);
        fixture
            .as_object_mut()
            .expect("fixture is an object")
            .remove("action");
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize payload {name}: {e}"));
        assert_eq!(serde_json::to_value(&parsed).unwrap(), fixture);
    }

    // --- Record tests ---

    #[test]
    fn fixture_start() {
        let msg = roundtrip_test("start.json");
        let ChannelMessage::Start(start) = msg else {
            panic!("expected start record");
        };
        assert_eq!(start.total_chunks, 3);
        assert_eq!(start.mime_type, "application/pdf");
        payload_matches::<StartRecord>("start.json");
    }

    #[test]
    fn fixture_chunk() {
        let msg = roundtrip_test("chunk.json");
        let ChannelMessage::Chunk(chunk) = msg else {
            panic!("expected chunk record");
        };
        assert_eq!(chunk.index, 1);
        let bytes = decode_chunk(&chunk.data).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
        payload_matches::<ChunkRecord>("chunk.json");
    }

    #[test]
    fn fixture_finish() {
        let msg = roundtrip_test("finish.json");
        assert_eq!(msg.action(), "finish");
        payload_matches::<FinishRecord>("finish.json");
    }

    #[test]
    fn fixture_error() {
        let msg = roundtrip_test("error.json");
        assert_eq!(msg.action(), "error");
        payload_matches::<ErrorRecord>("error.json");
    }

    #[test]
    fn all_fixtures_share_one_transfer_id() {
        let ids: Vec<String> = ["start.json", "chunk.json", "finish.json", "error.json"]
            .iter()
            .map(|name| roundtrip_test(name).id().to_string())
            .collect();
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn sender_may_omit_optional_start_fields() {
        let text = r#"{"action":"start","id":"t","totalChunks":1}"#;
        let ChannelMessage::Start(start) = ChannelMessage::parse(text).unwrap() else {
            panic!("expected start record");
        };
        assert_eq!(start.filename, "");
        assert_eq!(start.size, 0);
    }
}
