// Chirp - An object-oriented client for the Twitter REST and Streaming APIs
// Copyright (C) 2025 Chirp Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Streaming API
//!
//! A [`Stream`] describes one streaming endpoint: which credentials to
//! connect with, which filter to apply and how to build items out of the
//! received lines. [`Stream::open`] connects and returns a
//! [`MessageStream`], consumed with `futures::StreamExt::next`.

mod message;

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{ready, StreamExt};
use tracing::debug;

pub use message::{DefaultMessageFactory, Message, MessageFactory, RawMessageFactory};

use crate::api::{Flow, Operation, Parameters};
use crate::config::ApiConfig;
use crate::credentials::SharedCredentials;
use crate::error::{Error, Result};
use crate::log_stream;

/// Streaming endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum StreamKind {
    /// Small random sample of all public statuses
    Sample,
    /// Public statuses matching the filter
    Filter(FilterParams),
    /// All public statuses (restricted access)
    Firehose,
    /// Public statuses containing links (restricted access)
    Links,
    /// All public retweets (restricted access)
    Retweet,
    /// Everything concerning the authenticated user
    User,
}

impl StreamKind {
    pub fn name(&self) -> &'static str {
        match self {
            StreamKind::Sample => "sample",
            StreamKind::Filter(_) => "filter",
            StreamKind::Firehose => "firehose",
            StreamKind::Links => "links",
            StreamKind::Retweet => "retweet",
            StreamKind::User => "user",
        }
    }

    fn operation(&self, config: &ApiConfig) -> Operation {
        let scheme = config.scheme();
        match self {
            StreamKind::User => Operation::dynamic(
                "POST",
                format!("{}://{}/2/user", scheme, config.user_stream_host),
            ),
            StreamKind::Filter(_) => Operation::dynamic(
                "POST",
                format!("{}://{}/1/statuses/filter", scheme, config.stream_host),
            ),
            other => Operation::dynamic(
                "GET",
                format!("{}://{}/1/statuses/{}", scheme, config.stream_host, other.name()),
            ),
        }
    }

    fn parameters(&self) -> Result<Parameters> {
        match self {
            StreamKind::Filter(filter) => filter.to_parameters(),
            _ => Ok(Parameters::new()),
        }
    }
}

/// South-west and north-east corners of an area, as longitude/latitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south_west: (f64, f64),
    pub north_east: (f64, f64),
}

/// Predicates of the filter stream; at least one must be set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterParams {
    /// User ids whose statuses are delivered
    pub follow: Vec<u64>,
    /// Keywords to track
    pub track: Vec<String>,
    pub locations: Vec<BoundingBox>,
}

impl FilterParams {
    pub fn follow(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            follow: ids.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn track<S: Into<String>>(keywords: impl IntoIterator<Item = S>) -> Self {
        Self {
            track: keywords.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.follow.is_empty() && self.track.is_empty() && self.locations.is_empty()
    }

    fn to_parameters(&self) -> Result<Parameters> {
        if self.is_empty() {
            return Err(Error::OperationValue(
                "filter stream needs follow, track or locations".into(),
            ));
        }

        let mut parameters = Parameters::new();
        if !self.follow.is_empty() {
            parameters.insert("follow".into(), join(self.follow.iter()));
        }
        if !self.track.is_empty() {
            parameters.insert("track".into(), join(self.track.iter()));
        }
        if !self.locations.is_empty() {
            let corners = self.locations.iter().flat_map(|area| {
                [
                    area.south_west.0,
                    area.south_west.1,
                    area.north_east.0,
                    area.north_east.1,
                ]
            });
            parameters.insert("locations".into(), join(corners));
        }
        Ok(parameters)
    }
}

fn join<T: ToString>(items: impl Iterator<Item = T>) -> String {
    items.map(|item| item.to_string()).collect::<Vec<_>>().join(",")
}

/// A streaming endpoint bound to credentials and a message factory
#[derive(Debug, Clone)]
pub struct Stream<F = DefaultMessageFactory> {
    credentials: SharedCredentials,
    factory: Arc<F>,
    kind: StreamKind,
}

impl Stream<DefaultMessageFactory> {
    pub fn new(credentials: SharedCredentials, kind: StreamKind) -> Self {
        Self {
            credentials,
            factory: Arc::new(DefaultMessageFactory),
            kind,
        }
    }

    pub fn sample(credentials: SharedCredentials) -> Self {
        Self::new(credentials, StreamKind::Sample)
    }

    pub fn filter(credentials: SharedCredentials, filter: FilterParams) -> Self {
        Self::new(credentials, StreamKind::Filter(filter))
    }

    pub fn firehose(credentials: SharedCredentials) -> Self {
        Self::new(credentials, StreamKind::Firehose)
    }

    pub fn links(credentials: SharedCredentials) -> Self {
        Self::new(credentials, StreamKind::Links)
    }

    pub fn retweet(credentials: SharedCredentials) -> Self {
        Self::new(credentials, StreamKind::Retweet)
    }

    pub fn user(credentials: SharedCredentials) -> Self {
        Self::new(credentials, StreamKind::User)
    }
}

impl<F: MessageFactory> Stream<F> {
    /// Same endpoint, different items
    pub fn with_factory<G: MessageFactory>(self, factory: G) -> Stream<G> {
        Stream {
            credentials: self.credentials,
            factory: Arc::new(factory),
            kind: self.kind,
        }
    }

    pub fn kind(&self) -> &StreamKind {
        &self.kind
    }

    /// Connect. Errors here mean the server refused the stream.
    pub async fn open(&self) -> Result<MessageStream<F>> {
        let operation = self.kind.operation(self.credentials.api().config());
        let parameters = self.kind.parameters()?;
        debug!(stream = self.kind.name(), "Opening stream");

        let flow = self.credentials.flow(&operation, parameters).await?;
        Ok(MessageStream {
            flow,
            factory: self.factory.clone(),
            credentials: self.credentials.clone(),
            name: self.kind.name(),
        })
    }
}

/// Items of an open stream.
///
/// A line that cannot be decoded or built yields an error and the stream
/// goes on. The stream ends when the connection closes or fails.
pub struct MessageStream<F: MessageFactory> {
    flow: Flow,
    factory: Arc<F>,
    credentials: SharedCredentials,
    name: &'static str,
}

impl<F: MessageFactory> futures::Stream for MessageStream<F> {
    type Item = Result<F::Message>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match ready!(this.flow.poll_next_unpin(cx)) {
                Some(Ok(value)) => match this.factory.make(&this.credentials, value) {
                    Ok(Some(message)) => {
                        log_stream!(message, this.name, std::any::type_name::<F::Message>());
                        return Poll::Ready(Some(Ok(message)));
                    }
                    Ok(None) => continue,
                    Err(e) => return Poll::Ready(Some(Err(e))),
                },
                Some(Err(e)) => return Poll::Ready(Some(Err(e))),
                None => return Poll::Ready(None),
            }
        }
    }
}
