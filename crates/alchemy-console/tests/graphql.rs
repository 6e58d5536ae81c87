use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use alchemy_console::*;
use alchemy_schema::{CollectionDraft, FieldDefinition, FieldType, SchemaLevel, build_schema};
use serde_json::{Value, json};

/// Serves exactly one HTTP request with the given status line and body and
/// hands back the request body it received.
fn fake_backend(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut content_length = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line == "\r\n" || line.is_empty() {
                break;
            }
            let lower = line.to_ascii_lowercase();
            if let Some(value) = lower.strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap();
            }
        }
        let mut request_body = vec![0; content_length];
        reader.read_exact(&mut request_body).unwrap();

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        let mut stream = stream;
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();

        String::from_utf8(request_body).unwrap()
    });

    (format!("http://{addr}/graphql"), handle)
}

fn users_request() -> CreateCollection {
    let draft = CollectionDraft::new("users")
        .with_field(FieldDefinition::new("email", FieldType::Email).required())
        .with_field(FieldDefinition::new("age", FieldType::Integer));
    CreateCollection {
        name: "users".into(),
        schema: build_schema(&draft, SchemaLevel::Strict).unwrap(),
    }
}

fn submitter(url: &str) -> GraphqlSubmitter {
    GraphqlSubmitter::new(url, Duration::from_secs(5))
}

#[test]
fn posts_the_create_collection_mutation() {
    let (url, backend) = fake_backend("200 OK", r#"{"data":{"createCollection":true}}"#);

    let created = submitter(&url).submit(&users_request()).unwrap();
    assert_eq!(
        created,
        CollectionCreated {
            name: "users".into(),
            fields: 2,
        }
    );

    let sent: Value = serde_json::from_str(&backend.join().unwrap()).unwrap();
    assert!(
        sent["query"]
            .as_str()
            .unwrap()
            .contains("createCollection(name: $name, schema: $schema)")
    );
    assert_eq!(sent["variables"]["name"], "users");
    assert_eq!(sent["variables"]["schema"]["level"], "strict");
    assert_eq!(sent["variables"]["schema"]["rule"]["required"], json!(["email"]));
    assert_eq!(
        sent["variables"]["schema"]["rule"]["properties"]["age"],
        json!({ "type": "integer" })
    );
}

#[test]
fn false_result_is_a_rejection() {
    let (url, backend) = fake_backend("200 OK", r#"{"data":{"createCollection":false}}"#);

    let err = submitter(&url).submit(&users_request()).unwrap_err();
    backend.join().unwrap();
    assert_eq!(
        err,
        SubmissionError::Rejected("backend refused to create 'users'".into())
    );
}

#[test]
fn graphql_errors_are_rejections() {
    let (url, backend) = fake_backend(
        "200 OK",
        r#"{"data":null,"errors":[{"message":"duplicate name"},{"message":"second"}]}"#,
    );

    let err = submitter(&url).submit(&users_request()).unwrap_err();
    backend.join().unwrap();
    assert_eq!(err, SubmissionError::Rejected("duplicate name".into()));
}

#[test]
fn error_status_keeps_the_body() {
    let (url, backend) = fake_backend("500 Internal Server Error", r#"{"error":"boom"}"#);

    let err = submitter(&url).submit(&users_request()).unwrap_err();
    backend.join().unwrap();
    assert_eq!(
        err,
        SubmissionError::Status {
            status: 500,
            body: r#"{"error":"boom"}"#.into(),
        }
    );
}

#[test]
fn garbage_response_is_a_decode_error() {
    let (url, backend) = fake_backend("200 OK", "<html>");

    let err = submitter(&url).submit(&users_request()).unwrap_err();
    backend.join().unwrap();
    assert!(matches!(err, SubmissionError::Decode(_)));
    assert!(err.to_string().starts_with("could not decode backend response: "));
}

#[test]
fn empty_graphql_response_is_a_decode_error() {
    let (url, backend) = fake_backend("200 OK", r#"{"data":null}"#);

    let err = submitter(&url).submit(&users_request()).unwrap_err();
    backend.join().unwrap();
    assert_eq!(
        err,
        SubmissionError::Decode("response has neither data nor errors".into())
    );
}

#[test]
fn unreachable_backend_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = submitter(&format!("http://{addr}/graphql"))
        .submit(&users_request())
        .unwrap_err();
    assert!(matches!(err, SubmissionError::Transport(_)));
}
