#![allow(dead_code)]

use async_trait::async_trait;
use results_ingest::error::{ErrorKind, IngestError};
use results_ingest::method::MethodResponse;
use results_ingest::services::{
    Invocation, MethodInvoker, ObjectStore, QueueSink, Services, TopicPublisher,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(format!("./tests/fixtures/{}", name)).expect("failed to read fixture")
}

pub fn fixture_json(name: &str) -> Value {
    serde_json::from_slice(&fixture(name)).expect("fixture is not valid JSON")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
}

#[derive(Default, Debug, Clone)]
pub struct FakeStore {
    objects: Arc<Mutex<HashMap<(String, String), Vec<u8>>>>,
    writes: Arc<Mutex<Vec<Write>>>,
}

impl FakeStore {
    pub fn with_object(self, bucket: &str, key: &str, body: Vec<u8>) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), body);
        self
    }

    pub fn take_writes(&self) -> Vec<Write> {
        std::mem::take(&mut self.writes.lock().unwrap())
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn read_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, IngestError> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| IngestError::Aws {
                kind: ErrorKind::Configuration,
                service: "S3",
                message: format!("NoSuchKey: s3://{}/{}", bucket, key),
            })
    }

    async fn write_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), IngestError> {
        self.writes.lock().unwrap().push(Write {
            bucket: bucket.to_string(),
            key: key.to_string(),
            body,
        });
        Ok(())
    }
}

/// Runs a method handler in-process in place of a Lambda invocation.
#[derive(Clone)]
pub struct InProcessInvoker {
    method: fn(&Value, &str) -> MethodResponse,
    requests: Arc<Mutex<Vec<(String, Value)>>>,
}

impl InProcessInvoker {
    pub fn new(method: fn(&Value, &str) -> MethodResponse) -> Self {
        InProcessInvoker {
            method,
            requests: Arc::default(),
        }
    }

    pub fn take_requests(&self) -> Vec<(String, Value)> {
        std::mem::take(&mut self.requests.lock().unwrap())
    }
}

#[async_trait]
impl MethodInvoker for InProcessInvoker {
    async fn invoke(&self, function_name: &str, payload: Vec<u8>) -> Result<Invocation, IngestError> {
        let request: Value = serde_json::from_slice(&payload)?;
        let response = (self.method)(&request, "in-process");
        self.requests
            .lock()
            .unwrap()
            .push((function_name.to_string(), request));
        Ok(Invocation {
            payload: serde_json::to_vec(&response)?,
            function_error: None,
        })
    }
}

/// Answers every invocation with the same raw result.
#[derive(Debug, Clone)]
pub struct CannedInvoker(pub Invocation);

impl CannedInvoker {
    pub fn payload(payload: &str) -> Self {
        CannedInvoker(Invocation {
            payload: payload.as_bytes().to_vec(),
            function_error: None,
        })
    }
}

#[async_trait]
impl MethodInvoker for CannedInvoker {
    async fn invoke(&self, _: &str, _: Vec<u8>) -> Result<Invocation, IngestError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueuedMessage {
    pub queue_url: String,
    pub body: String,
    pub group_id: String,
    pub deduplication_id: String,
}

#[derive(Default, Debug, Clone)]
pub struct FakeQueue {
    messages: Arc<Mutex<Vec<QueuedMessage>>>,
}

impl FakeQueue {
    pub fn take_messages(&self) -> Vec<QueuedMessage> {
        std::mem::take(&mut self.messages.lock().unwrap())
    }
}

#[async_trait]
impl QueueSink for FakeQueue {
    async fn send_message(
        &self,
        queue_url: &str,
        body: String,
        group_id: &str,
        deduplication_id: &str,
    ) -> Result<(), IngestError> {
        self.messages.lock().unwrap().push(QueuedMessage {
            queue_url: queue_url.to_string(),
            body,
            group_id: group_id.to_string(),
            deduplication_id: deduplication_id.to_string(),
        });
        Ok(())
    }
}

#[derive(Default, Debug, Clone)]
pub struct FakeTopic {
    published: Arc<Mutex<Vec<(String, Value)>>>,
}

impl FakeTopic {
    pub fn take_published(&self) -> Vec<(String, Value)> {
        std::mem::take(&mut self.published.lock().unwrap())
    }
}

#[async_trait]
impl TopicPublisher for FakeTopic {
    async fn publish(&self, topic_arn: &str, message: String) -> Result<(), IngestError> {
        let message = serde_json::from_str(&message)?;
        self.published
            .lock()
            .unwrap()
            .push((topic_arn.to_string(), message));
        Ok(())
    }
}

pub struct Harness<I> {
    pub store: FakeStore,
    pub invoker: I,
    pub queue: FakeQueue,
    pub topic: FakeTopic,
}

impl<I: MethodInvoker> Harness<I> {
    pub fn new(store: FakeStore, invoker: I) -> Self {
        Harness {
            store,
            invoker,
            queue: FakeQueue::default(),
            topic: FakeTopic::default(),
        }
    }

    pub fn services(&self) -> Services<'_> {
        Services {
            store: &self.store,
            invoker: &self.invoker,
            queue: &self.queue,
            topic: &self.topic,
        }
    }
}
