//! Single-resource mutation handlers.
//!
//! Create, update and delete are written once, generic over the resource.
//! Which resources may use which handler is decided by the `Announces*`
//! traits, so a resource without a published notification type for an
//! action cannot be mutated that way through the application layer.

use std::sync::Arc;

use crate::domain::notification::{AnnouncesCreate, AnnouncesDelete, AnnouncesUpdate, ChangeEvent};
use crate::domain::tracking::Resource;
use crate::ports::{ChangePublisher, EntityStore, UnitOfWork};

use crate::application::notify::publish_change;
use crate::application::{MutationError, TransactionRunner};

/// Handler for creating a resource and announcing it.
pub struct CreateResourceHandler<U: UnitOfWork, E: Resource> {
    transactions: TransactionRunner<U>,
    store: Arc<dyn EntityStore<U::Tx, E>>,
    publisher: Arc<dyn ChangePublisher>,
}

impl<U: UnitOfWork, E: AnnouncesCreate> CreateResourceHandler<U, E> {
    pub fn new(
        transactions: TransactionRunner<U>,
        store: Arc<dyn EntityStore<U::Tx, E>>,
        publisher: Arc<dyn ChangePublisher>,
    ) -> Self {
        Self {
            transactions,
            store,
            publisher,
        }
    }

    /// Persists `draft` and publishes a create event carrying the stored row.
    pub async fn handle(&self, draft: E::Draft) -> Result<E, MutationError> {
        let store = Arc::clone(&self.store);
        let publisher = Arc::clone(&self.publisher);

        self.transactions
            .run(
                move |tx| Box::pin(async move { store.insert(tx, draft).await.map_err(MutationError::from) }),
                move |created: E| async move {
                    tracing::debug!(kind = %E::KIND, id = %created.id(), "Resource created");
                    let event = ChangeEvent::created(E::CREATE, created.id(), created.clone());
                    publish_change(publisher.as_ref(), event).await;
                    created
                },
            )
            .await
    }
}

/// Handler for overwriting an existing resource and announcing it.
pub struct UpdateResourceHandler<U: UnitOfWork, E: Resource> {
    transactions: TransactionRunner<U>,
    store: Arc<dyn EntityStore<U::Tx, E>>,
    publisher: Arc<dyn ChangePublisher>,
}

impl<U: UnitOfWork, E: AnnouncesUpdate> UpdateResourceHandler<U, E> {
    pub fn new(
        transactions: TransactionRunner<U>,
        store: Arc<dyn EntityStore<U::Tx, E>>,
        publisher: Arc<dyn ChangePublisher>,
    ) -> Self {
        Self {
            transactions,
            store,
            publisher,
        }
    }

    /// Persists `entity` and publishes an update event carrying the stored row.
    ///
    /// Fails with `NotFound` if no resource has `entity`'s id.
    pub async fn handle(&self, entity: E) -> Result<E, MutationError> {
        let store = Arc::clone(&self.store);
        let publisher = Arc::clone(&self.publisher);

        self.transactions
            .run(
                move |tx| Box::pin(async move { update_existing(store.as_ref(), tx, entity).await }),
                move |updated: E| async move {
                    tracing::debug!(kind = %E::KIND, id = %updated.id(), "Resource updated");
                    let event = ChangeEvent::updated(E::UPDATE, updated.id(), updated.clone());
                    publish_change(publisher.as_ref(), event).await;
                    updated
                },
            )
            .await
    }
}

async fn update_existing<Tx: Send, E: Resource>(
    store: &dyn EntityStore<Tx, E>,
    tx: &mut Tx,
    mut entity: E,
) -> Result<E, MutationError> {
    entity.touch();
    store
        .update(tx, &entity)
        .await?
        .ok_or_else(|| MutationError::not_found(E::KIND, entity.id()))
}

/// Handler for deleting a resource that has no dependents of its own.
pub struct DeleteResourceHandler<U: UnitOfWork, E: Resource> {
    transactions: TransactionRunner<U>,
    store: Arc<dyn EntityStore<U::Tx, E>>,
    publisher: Arc<dyn ChangePublisher>,
}

impl<U: UnitOfWork, E: AnnouncesDelete> DeleteResourceHandler<U, E> {
    pub fn new(
        transactions: TransactionRunner<U>,
        store: Arc<dyn EntityStore<U::Tx, E>>,
        publisher: Arc<dyn ChangePublisher>,
    ) -> Self {
        Self {
            transactions,
            store,
            publisher,
        }
    }

    /// Deletes the resource and publishes a delete event without data.
    pub async fn handle(&self, id: E::Id) -> Result<(), MutationError> {
        let store = Arc::clone(&self.store);
        let publisher = Arc::clone(&self.publisher);

        self.transactions
            .run(
                move |tx| Box::pin(async move { delete_existing(store.as_ref(), tx, id).await }),
                move |deleted: E::Id| async move {
                    tracing::debug!(kind = %E::KIND, id = %deleted, "Resource deleted");
                    let event = ChangeEvent::<E>::deleted(E::DELETE, deleted);
                    publish_change(publisher.as_ref(), event).await;
                },
            )
            .await
    }
}

async fn delete_existing<Tx: Send, E: Resource>(
    store: &dyn EntityStore<Tx, E>,
    tx: &mut Tx,
    id: E::Id,
) -> Result<E::Id, MutationError> {
    if store.delete(tx, id).await? {
        Ok(id)
    } else {
        Err(MutationError::not_found(E::KIND, id))
    }
}
