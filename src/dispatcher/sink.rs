use std::io::Write;

use anyhow::{Context, Result};
use serde_json::Value;

use super::HandlerResponse;

/// Destination for the single response a dispatch produces.
pub trait ResponseSink {
    fn send(&mut self, response: &HandlerResponse) -> Result<()>;
}

/// Keeps every response it is given. Useful for tests and embedding.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub sent: Vec<HandlerResponse>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn last(&self) -> Option<&HandlerResponse> {
        self.sent.last()
    }
}

impl ResponseSink for RecordingSink {
    fn send(&mut self, response: &HandlerResponse) -> Result<()> {
        self.sent.push(response.clone());
        Ok(())
    }
}

/// Serializes responses as HTTP/1.1 messages onto a writer.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

pub(crate) fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

impl<W: Write> ResponseSink for WriterSink<W> {
    fn send(&mut self, response: &HandlerResponse) -> Result<()> {
        let (content_type, body) = match &response.body {
            Value::Null => (None, Vec::new()),
            Value::String(s) => (Some("text/plain"), s.clone().into_bytes()),
            other => (
                Some("application/json"),
                serde_json::to_vec(other).context("serializing response body")?,
            ),
        };

        write!(
            self.writer,
            "HTTP/1.1 {} {}\r\n",
            response.status,
            status_reason(response.status)
        )?;
        for (name, value) in &response.headers {
            write!(self.writer, "{name}: {value}\r\n")?;
        }
        if let Some(ct) = content_type {
            if response.get_header("content-type").is_none() {
                write!(self.writer, "content-type: {ct}\r\n")?;
            }
        }
        write!(self.writer, "content-length: {}\r\n\r\n", body.len())?;
        self.writer.write_all(&body)?;
        self.writer.flush().context("flushing response")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(599), "Unknown");
    }

    #[test]
    fn test_writer_sink_json_body() {
        let mut sink = WriterSink::new(Vec::new());
        sink.send(&HandlerResponse::error(404, "missing")).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("content-type: application/json\r\n"));
        assert!(text.ends_with("{\"error\":\"missing\"}"));
        assert_eq!(text.matches("content-type").count(), 1);
    }

    #[test]
    fn test_writer_sink_empty_body() {
        let mut sink = WriterSink::new(Vec::new());
        sink.send(&HandlerResponse::empty(204)).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "HTTP/1.1 204 No Content\r\ncontent-length: 0\r\n\r\n");
    }

    #[test]
    fn test_recording_sink_keeps_order() {
        let mut sink = RecordingSink::new();
        sink.send(&HandlerResponse::empty(200)).unwrap();
        sink.send(&HandlerResponse::empty(201)).unwrap();
        assert_eq!(sink.sent.len(), 2);
        assert_eq!(sink.last().unwrap().status, 201);
    }
}
