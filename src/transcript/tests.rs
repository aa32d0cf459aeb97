use super::*;
use serde_json::json;

#[test]
fn parse_user_text_message() {
    let input = json!({
        "type": "user",
        "uuid": "aaa",
        "parentUuid": null,
        "isSidechain": false,
        "userType": "external",
        "cwd": "/tmp",
        "sessionId": "sess-1",
        "timestamp": "2025-01-01T00:00:00Z",
        "version": "1.0",
        "message": {
            "role": "user",
            "content": "hello world"
        }
    });

    let entry: TranscriptEntry = serde_json::from_value(input).unwrap();
    match entry {
        TranscriptEntry::User(e) => {
            assert_eq!(e.uuid, "aaa");
            assert!(e.parent_uuid.is_none());
            match &e.message.content {
                MessageContent::Text(t) => assert_eq!(t, "hello world"),
                other => panic!("expected Text, got {:?}", other),
            }
        }
        other => panic!("expected User, got {:?}", other),
    }
}

#[test]
fn parse_assistant_with_text_and_tool_use() {
    let input = json!({
        "type": "assistant",
        "uuid": "bbb",
        "parentUuid": "aaa",
        "isSidechain": false,
        "userType": "external",
        "cwd": "/tmp",
        "sessionId": "sess-1",
        "timestamp": "2025-01-01T00:00:01Z",
        "version": "1.0",
        "requestId": "req-1",
        "message": {
            "role": "assistant",
            "type": "message",
            "model": "claude-opus-4-5-20251101",
            "id": "msg_01",
            "content": [
                { "type": "thinking", "thinking": "hmm", "signature": "sig" },
                { "type": "text", "text": "Let me read that file." },
                {
                    "type": "tool_use",
                    "id": "toolu_01",
                    "name": "Read",
                    "input": { "file_path": "/tmp/f.txt" }
                }
            ],
            "stop_reason": "tool_use",
            "usage": {
                "input_tokens": 100,
                "output_tokens": 50,
                "cache_creation_input_tokens": 0,
                "cache_read_input_tokens": 80,
                "service_tier": "standard"
            }
        }
    });

    let entry: TranscriptEntry = serde_json::from_value(input).unwrap();
    match entry {
        TranscriptEntry::Assistant(e) => {
            assert_eq!(e.request_id.as_deref(), Some("req-1"));
            assert_eq!(e.message.model.as_deref(), Some("claude-opus-4-5-20251101"));
            let blocks = match &e.message.content {
                MessageContent::Blocks(b) => b,
                other => panic!("expected Blocks, got {:?}", other),
            };
            assert_eq!(blocks.len(), 3);
            assert!(matches!(&blocks[0], ContentBlock::Thinking(_)));
            assert!(matches!(&blocks[1], ContentBlock::Text(_)));
            assert!(matches!(&blocks[2], ContentBlock::ToolUse(_)));

            let usage = e.message.usage.as_ref().unwrap();
            assert_eq!(usage.input_tokens, 100);
            assert_eq!(usage.output_tokens, 50);
            assert_eq!(usage.cache_read_input_tokens, 80);
        }
        other => panic!("expected Assistant, got {:?}", other),
    }
}

#[test]
fn parse_user_tool_result() {
    let input = json!({
        "type": "user",
        "uuid": "ccc",
        "parentUuid": "bbb",
        "isSidechain": false,
        "userType": "external",
        "cwd": "/tmp",
        "sessionId": "sess-1",
        "timestamp": "2025-01-01T00:00:02Z",
        "version": "1.0",
        "message": {
            "role": "user",
            "content": [
                {
                    "type": "tool_result",
                    "tool_use_id": "toolu_01",
                    "content": "file contents here"
                }
            ]
        },
        "toolUseResult": {
            "type": "text",
            "file": {
                "filePath": "/tmp/f.txt",
                "content": "file contents here",
                "numLines": 10,
                "startLine": 1,
                "totalLines": 10
            }
        }
    });

    let entry: TranscriptEntry = serde_json::from_value(input).unwrap();
    match entry {
        TranscriptEntry::User(e) => {
            let result = e.tool_use_result.unwrap();
            match result {
                ToolUseResult::Read(r) => {
                    assert_eq!(r.result_type, "text");
                    assert_eq!(r.file.file_path, "/tmp/f.txt");
                    assert_eq!(r.file.total_lines, 10);
                }
                other => panic!("expected Read, got {:?}", other),
            }
        }
        other => panic!("expected User, got {:?}", other),
    }
}

#[test]
fn parse_progress_entry() {
    let input = json!({
        "type": "progress",
        "uuid": "ddd",
        "parentUuid": "bbb",
        "isSidechain": false,
        "userType": "external",
        "cwd": "/tmp",
        "sessionId": "sess-1",
        "timestamp": "2025-01-01T00:00:03Z",
        "version": "1.0",
        "toolUseID": "bash-progress-0",
        "parentToolUseID": "toolu_02",
        "data": {
            "type": "bash_progress",
            "output": "line 1\n",
            "fullOutput": "line 1\n",
            "elapsedTimeSeconds": 2,
            "totalLines": 1
        }
    });

    let entry: TranscriptEntry = serde_json::from_value(input).unwrap();
    match entry {
        TranscriptEntry::Progress(p) => {
            assert_eq!(p.tool_use_id.as_deref(), Some("bash-progress-0"));
            let data = p.data.as_ref().unwrap();
            assert_eq!(data.progress_type, "bash_progress");
            assert_eq!(data.total_lines, Some(1));
        }
        other => panic!("expected Progress, got {:?}", other),
    }
}

#[test]
fn parse_file_history_snapshot() {
    let input = json!({
        "type": "file-history-snapshot",
        "messageId": "msg-1",
        "isSnapshotUpdate": false,
        "snapshot": {
            "messageId": "msg-1",
            "timestamp": "2025-01-01T00:00:00Z",
            "trackedFileBackups": {
                "/tmp/f.txt": {
                    "backupFileName": "abc123@v1",
                    "version": 1,
                    "backupTime": "2025-01-01T00:00:00Z"
                }
            }
        }
    });

    let entry: TranscriptEntry = serde_json::from_value(input).unwrap();
    match entry {
        TranscriptEntry::FileHistorySnapshot(f) => {
            assert_eq!(f.message_id, "msg-1");
            let backup = f.snapshot.tracked_file_backups.get("/tmp/f.txt").unwrap();
            assert_eq!(backup.version, 1);
        }
        other => panic!("expected FileHistorySnapshot, got {:?}", other),
    }
}

#[test]
fn parse_queue_operation() {
    let input = json!({
        "type": "queue-operation",
        "operation": "enqueue",
        "timestamp": "2025-01-01T00:00:00Z",
        "sessionId": "sess-1",
        "content": "/model"
    });

    let entry: TranscriptEntry = serde_json::from_value(input).unwrap();
    match entry {
        TranscriptEntry::QueueOperation(q) => {
            assert_eq!(q.operation, "enqueue");
            assert_eq!(q.content.as_deref(), Some("/model"));
        }
        other => panic!("expected QueueOperation, got {:?}", other),
    }
}

#[test]
fn parse_system_turn_duration() {
    let input = json!({
        "type": "system",
        "uuid": "eee",
        "subtype": "turn_duration",
        "parentUuid": "bbb",
        "isSidechain": false,
        "userType": "external",
        "cwd": "/tmp",
        "sessionId": "sess-1",
        "timestamp": "2025-01-01T00:00:04Z",
        "version": "1.0",
        "durationMs": 12345,
        "isMeta": false
    });

    let entry: TranscriptEntry = serde_json::from_value(input).unwrap();
    match entry {
        TranscriptEntry::System(s) => {
            assert_eq!(s.subtype, "turn_duration");
            assert_eq!(s.duration_ms, Some(12345));
        }
        other => panic!("expected System, got {:?}", other),
    }
}

#[test]
fn parse_bash_tool_use_result() {
    let input = json!({
        "stdout": "hello\n",
        "stderr": "",
        "interrupted": false,
        "isImage": false
    });

    let result: ToolUseResult = serde_json::from_value(input).unwrap();
    match result {
        ToolUseResult::Bash(b) => {
            assert_eq!(b.stdout, "hello\n");
            assert_eq!(b.stderr, "");
        }
        other => panic!("expected Bash, got {:?}", other),
    }
}

#[test]
fn parse_edit_tool_use_result() {
    let input = json!({
        "filePath": "/tmp/f.rs",
        "oldString": "foo",
        "newString": "bar",
        "originalFile": "fn foo() {}",
        "structuredPatch": [{
            "oldStart": 1,
            "oldLines": 1,
            "newStart": 1,
            "newLines": 1,
            "lines": ["-fn foo() {}", "+fn bar() {}"]
        }],
        "userModified": false,
        "replaceAll": false
    });

    let result: ToolUseResult = serde_json::from_value(input).unwrap();
    match result {
        ToolUseResult::Edit(e) => {
            assert_eq!(e.file_path, "/tmp/f.rs");
            assert_eq!(e.old_string, "foo");
            assert_eq!(e.new_string, "bar");
            let patch = &e.structured_patch.unwrap()[0];
            assert_eq!(patch.lines.len(), 2);
        }
        other => panic!("expected Edit, got {:?}", other),
    }
}

#[test]
fn parse_transcript_helper() {
    let lines = [
        json!({
            "type": "user",
            "uuid": "a",
            "isSidechain": false,
            "userType": "external",
            "cwd": "/tmp",
            "sessionId": "s",
            "timestamp": "t",
            "version": "v",
            "message": { "role": "user", "content": "hi" }
        }),
        json!({
            "type": "system",
            "uuid": "b",
            "subtype": "turn_duration",
            "isSidechain": false,
            "userType": "external",
            "cwd": "/tmp",
            "sessionId": "s",
            "timestamp": "t",
            "version": "v",
            "durationMs": 100,
            "isMeta": false
        }),
    ];
    let contents = lines
        .iter()
        .map(|v| serde_json::to_string(v).unwrap())
        .collect::<Vec<_>>()
        .join("\n");

    let (transcript, errors) = Transcript::parse(&contents);
    assert_eq!(transcript.entries().len(), 2);
    assert!(errors.is_empty());
    assert!(matches!(&transcript.entries()[0], TranscriptEntry::User(_)));
    assert!(matches!(&transcript.entries()[1], TranscriptEntry::System(_)));
}

