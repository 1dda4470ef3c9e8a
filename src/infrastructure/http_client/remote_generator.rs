use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{build_agent, describe_http_error};
use crate::{
    application::services::{GenerationParams, TextGenerator},
    domain::DomainError,
};

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerationResponse {
    Single(GeneratedText),
    Batch(Vec<GeneratedText>),
}

/// Text generator calling a hosted text-generation endpoint over HTTP.
pub struct RemoteGenerator {
    endpoint: String,
    agent: ureq::Agent,
}

impl RemoteGenerator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, DomainError> {
        let endpoint = endpoint.into();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(DomainError::validation(format!(
                "generator endpoint must be an http(s) URL, got `{endpoint}`"
            )));
        }
        Ok(Self {
            endpoint,
            agent: build_agent(timeout),
        })
    }
}

impl TextGenerator for RemoteGenerator {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, DomainError> {
        let body = json!({
            "inputs": prompt,
            "parameters": {
                "max_new_tokens": params.max_new_tokens,
                "num_beams": params.num_beams,
                "do_sample": params.do_sample,
                "repetition_penalty": params.repetition_penalty,
                "truncate": params.max_input_tokens,
            },
        });

        let response = self
            .agent
            .post(&self.endpoint)
            .send_json(body)
            .map_err(|err| DomainError::generation(describe_http_error(err)))?;

        let parsed: GenerationResponse = response.into_json().map_err(|err| {
            DomainError::generation(format!("failed to parse generation response: {err}"))
        })?;

        let text = match parsed {
            GenerationResponse::Single(single) => single.generated_text,
            GenerationResponse::Batch(batch) => batch
                .into_iter()
                .next()
                .map(|item| item.generated_text)
                .ok_or_else(|| DomainError::generation("generation response was empty"))?,
        };
        debug!(target: "medirag::generation", chars = text.len(), "remote generation finished");
        Ok(text)
    }

    fn id(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    /// Serves one canned response and hands back the request body it received.
    fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/generate", listener.local_addr().unwrap());
        let reply = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
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
            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).unwrap();
            reader.get_mut().write_all(reply.as_bytes()).unwrap();
            String::from_utf8(request_body).unwrap()
        });
        (url, handle)
    }

    #[test]
    fn sends_prompt_with_decoding_parameters() {
        let (url, server) = serve_once("200 OK", r#"{"generated_text":"Angina is chest pain."}"#);
        let generator = RemoteGenerator::new(url, Duration::from_secs(5)).unwrap();

        let text = generator
            .generate("prompt text", &GenerationParams::default())
            .unwrap();
        assert_eq!(text, "Angina is chest pain.");

        let sent: serde_json::Value = serde_json::from_str(&server.join().unwrap()).unwrap();
        assert_eq!(sent["inputs"], "prompt text");
        assert_eq!(sent["parameters"]["max_new_tokens"], 512);
        assert_eq!(sent["parameters"]["num_beams"], 4);
        assert_eq!(sent["parameters"]["do_sample"], false);
        assert_eq!(sent["parameters"]["truncate"], 1024);
    }

    #[test]
    fn accepts_batched_responses() {
        let (url, server) = serve_once(
            "200 OK",
            r#"[{"generated_text":"first"},{"generated_text":"second"}]"#,
        );
        let generator = RemoteGenerator::new(url, Duration::from_secs(5)).unwrap();
        let text = generator.generate("p", &GenerationParams::default()).unwrap();
        assert_eq!(text, "first");
        server.join().unwrap();
    }

    #[test]
    fn server_errors_become_generation_failures() {
        let (url, server) = serve_once(
            "503 Service Unavailable",
            r#"{"error":"model is loading","error_type":"overloaded"}"#,
        );
        let generator = RemoteGenerator::new(url, Duration::from_secs(5)).unwrap();
        let err = generator
            .generate("p", &GenerationParams::default())
            .unwrap_err();
        server.join().unwrap();
        match err {
            DomainError::Generation(msg) => {
                assert!(msg.contains("503"));
                assert!(msg.contains("model is loading"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_non_http_endpoints() {
        assert!(RemoteGenerator::new("ftp://host/gen", Duration::from_secs(1)).is_err());
    }
}
