//! Kafka-backed [`BusProducer`].

use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;

use crate::{BusError, BusProducer};

#[derive(Clone)]
pub struct KafkaBus {
    producer: FutureProducer,
}

impl KafkaBus {
    /// `acks=all`: a domain event is only treated as published once every
    /// in-sync replica has it.
    pub fn connect(brokers: &[String]) -> anyhow::Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers.join(","))
            .set("acks", "all")
            .set("message.timeout.ms", "5000")
            .create()
            .context("failed to create kafka producer")?;
        Ok(Self { producer })
    }
}

#[async_trait]
impl BusProducer for KafkaBus {
    async fn send(
        &self,
        topic: &str,
        key: &str,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<(), BusError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);
        self.producer
            .send(record, Timeout::After(timeout))
            .await
            .map_err(|(err, _msg)| BusError(anyhow!(err).context("kafka send failed")))?;
        Ok(())
    }
}
