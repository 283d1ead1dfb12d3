use async_trait::async_trait;
use reqwest::{Method, StatusCode};

use super::wire::{EventBody, EventPatchBody, RemoteEvent};
use super::{RemoteClient, join};
use crate::backend::CatalogBackend;
use crate::domain::{Event, EventId, EventPatch, NewEvent};
use crate::error::StoreError;

/// Events service client.
///
/// The service keeps no sold counter: selling tickets shrinks `capacidad`.
#[derive(Debug, Clone)]
pub struct RemoteCatalog {
    client: RemoteClient,
    base_url: String,
}

impl RemoteCatalog {
    /// Creates a client for the events collection at `base_url`.
    #[must_use]
    pub fn new(client: RemoteClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    fn item_url(&self, id: &EventId) -> String {
        join(&self.base_url, &format!("{id}/"))
    }

    async fn patch(&self, id: &EventId, body: &EventPatchBody) -> Result<Event, StoreError> {
        let builder = self
            .client
            .request(Method::PATCH, &self.item_url(id))
            .await
            .json(body);
        let remote: RemoteEvent = self
            .client
            .send_json(builder, None)
            .await
            .map_err(|e| not_found_on_404(e, id))?;
        Ok(remote.into())
    }
}

fn not_found_on_404(err: StoreError, id: &EventId) -> StoreError {
    match err {
        StoreError::Http { status: 404, .. } => StoreError::not_found("event", id),
        other => other,
    }
}

#[async_trait]
impl CatalogBackend for RemoteCatalog {
    async fn list(&self) -> Result<Vec<Event>, StoreError> {
        let builder = self
            .client
            .request(Method::GET, &join(&self.base_url, ""))
            .await;
        let remote: Vec<RemoteEvent> = self.client.send_json(builder, None).await?;
        Ok(remote.into_iter().map(Event::from).collect())
    }

    async fn get(&self, id: &EventId) -> Result<Event, StoreError> {
        let builder = self.client.request(Method::GET, &self.item_url(id)).await;
        let remote: RemoteEvent = self
            .client
            .send_json(builder, None)
            .await
            .map_err(|e| not_found_on_404(e, id))?;
        Ok(remote.into())
    }

    async fn create(&self, new_event: NewEvent) -> Result<Event, StoreError> {
        let builder = self
            .client
            .request(Method::POST, &join(&self.base_url, ""))
            .await
            .json(&EventBody::from(&new_event));
        let remote: RemoteEvent = self
            .client
            .send_json(builder, Some(StatusCode::CREATED))
            .await?;
        let mut event = Event::from(remote);
        // The service does not store these two.
        event.description = new_event.description;
        event.image_url = new_event.image_url;
        Ok(event)
    }

    async fn update(&self, id: &EventId, patch: &EventPatch) -> Result<Event, StoreError> {
        let mut event = self.patch(id, &EventPatchBody::from(patch)).await?;
        if let Some(description) = &patch.description {
            event.description.clone_from(description);
        }
        if let Some(image_url) = &patch.image_url {
            event.image_url.clone_from(image_url);
        }
        Ok(event)
    }

    async fn delete(&self, id: &EventId) -> Result<(), StoreError> {
        let builder = self.client.request(Method::DELETE, &self.item_url(id)).await;
        self.client
            .send(builder, Some(StatusCode::NO_CONTENT))
            .await
            .map_err(|e| not_found_on_404(e, id))?;
        Ok(())
    }

    async fn record_sale(&self, id: &EventId, quantity: u32) -> Result<Event, StoreError> {
        let current = self.get(id).await?;
        let Some(remaining) = current.capacity.checked_sub(quantity) else {
            return Err(StoreError::InsufficientCapacity {
                requested: quantity,
                available: current.capacity,
            });
        };
        self.patch(id, &EventPatchBody::capacity(remaining)).await
    }
}
