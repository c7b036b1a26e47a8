//! Link manager: owns every config entry and its running link.

use std::collections::HashMap;
use std::sync::Arc;

use mitmlight_domain::error::{MitmLightError, NotFoundError};
use mitmlight_domain::id::LinkId;
use mitmlight_domain::link::{ConfigEntry, ConfigMap};
use mitmlight_domain::service::ServiceCall;

use crate::config_flow::{ConfigFlow, FlowResult};
use crate::link::Link;
use crate::ports::Host;

/// Application service for the link lifecycle: add, reload, remove, and
/// dispatching service calls to the owning link.
pub struct LinkManager<H> {
    host: Arc<H>,
    entries: Vec<ConfigEntry>,
    links: HashMap<LinkId, Link<H>>,
}

impl<H: Host> LinkManager<H> {
    /// Create a manager with no entries.
    pub fn new(host: Arc<H>) -> Self {
        Self {
            host,
            entries: Vec::new(),
            links: HashMap::new(),
        }
    }

    /// All config entries, loaded or not, in creation order.
    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    pub fn entry(&self, entry_id: LinkId) -> Option<&ConfigEntry> {
        self.entries.iter().find(|entry| entry.entry_id == entry_id)
    }

    /// Running link of an entry; `None` when its setup failed.
    pub fn link(&self, entry_id: LinkId) -> Option<&Link<H>> {
        self.links.get(&entry_id)
    }

    /// Keep an entry and set its link up.
    ///
    /// An entry whose setup fails is still kept, without a running link,
    /// so it can be fixed through the options flow.
    ///
    /// # Errors
    ///
    /// Returns the setup error.
    #[tracing::instrument(skip(self, entry), fields(entry_id = %entry.entry_id, title = %entry.title))]
    pub async fn add_entry(&mut self, entry: ConfigEntry) -> Result<LinkId, MitmLightError> {
        let entry_id = entry.entry_id;
        self.entries.push(entry);
        self.setup(entry_id).await?;
        Ok(entry_id)
    }

    /// Run the user step of the config flow, adding the entry it creates.
    ///
    /// # Errors
    ///
    /// Propagates flow and setup failures.
    pub async fn user_flow(&mut self, input: Option<&ConfigMap>) -> Result<FlowResult, MitmLightError> {
        let result = ConfigFlow::new(&*self.host)
            .step_user(&self.entries, input)
            .await?;
        if let FlowResult::CreateEntry { title, data } = &result {
            self.add_entry(ConfigEntry::new(title.clone(), data.clone()))
                .await?;
        }
        Ok(result)
    }

    /// Run the options step for an entry, applying the options it creates.
    ///
    /// # Errors
    ///
    /// Returns [`MitmLightError::NotFound`] for an unknown entry, or
    /// propagates flow and reload failures.
    pub async fn options_flow(
        &mut self,
        entry_id: LinkId,
        input: Option<&ConfigMap>,
    ) -> Result<FlowResult, MitmLightError> {
        let entry = self.entry(entry_id).ok_or_else(|| not_found(entry_id))?;
        let result = ConfigFlow::new(&*self.host)
            .step_init(entry, input)
            .await?;
        if let FlowResult::CreateEntry { data, .. } = &result {
            self.update_options(entry_id, data.clone()).await?;
        }
        Ok(result)
    }

    /// Replace an entry's options and reload its link.
    ///
    /// # Errors
    ///
    /// Returns [`MitmLightError::NotFound`] for an unknown entry, or
    /// propagates reload failures.
    #[tracing::instrument(skip(self, options))]
    pub async fn update_options(
        &mut self,
        entry_id: LinkId,
        options: ConfigMap,
    ) -> Result<(), MitmLightError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.entry_id == entry_id)
            .ok_or_else(|| not_found(entry_id))?;
        entry.options = options;
        self.reload(entry_id).await
    }

    /// Unload and set an entry's link up again.
    ///
    /// # Errors
    ///
    /// Returns [`MitmLightError::NotFound`] for an unknown entry, or
    /// propagates unload and setup failures.
    #[tracing::instrument(skip(self))]
    pub async fn reload(&mut self, entry_id: LinkId) -> Result<(), MitmLightError> {
        if self.entry(entry_id).is_none() {
            return Err(not_found(entry_id));
        }
        if let Some(link) = self.links.remove(&entry_id) {
            link.unload().await?;
        }
        self.setup(entry_id).await
    }

    /// Unload an entry and forget everything about it: registry entries
    /// and saved states included.
    ///
    /// # Errors
    ///
    /// Returns [`MitmLightError::NotFound`] for an unknown entry, or
    /// propagates host failures.
    #[tracing::instrument(skip(self))]
    pub async fn remove_entry(&mut self, entry_id: LinkId) -> Result<(), MitmLightError> {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.entry_id == entry_id)
            .ok_or_else(|| not_found(entry_id))?;
        self.entries.remove(position);

        if let Some(link) = self.links.remove(&entry_id) {
            link.unload().await?;
        }
        let removed = self.host.remove_config_entry(entry_id).await?;
        for entity_id in &removed {
            self.host.forget_state(entity_id).await?;
        }
        tracing::info!(entities = removed.len(), "entry removed");
        Ok(())
    }

    /// Dispatch a service call to the link owning the entity, then let
    /// every link react to the resulting state changes.
    ///
    /// # Errors
    ///
    /// Returns [`MitmLightError::NotFound`] when no link owns the entity,
    /// or the link's error.
    #[tracing::instrument(skip(self, call), fields(service = %call.qualified_name(), entity_id = %call.entity_id))]
    pub async fn handle_service_call(&mut self, call: &ServiceCall) -> Result<(), MitmLightError> {
        let link = self
            .links
            .values_mut()
            .find(|link| link.owns_entity(&call.entity_id))
            .ok_or_else(|| NotFoundError {
                entity: "Entity",
                id: call.entity_id.clone(),
            })?;
        link.handle_service_call(call).await?;
        self.process_events().await;
        Ok(())
    }

    /// Let every link react to state changes published so far, returning
    /// how many events were handled.
    pub async fn process_events(&mut self) -> usize {
        let mut handled = 0;
        for link in self.links.values_mut() {
            handled += link.process_pending_events().await;
        }
        handled
    }

    /// Unload every running link, keeping the entries.
    ///
    /// # Errors
    ///
    /// Returns the first unload failure; the remaining links are still
    /// unloaded.
    pub async fn unload_all(&mut self) -> Result<(), MitmLightError> {
        let mut first_error = None;
        for (entry_id, link) in self.links.drain() {
            if let Err(err) = link.unload().await {
                tracing::warn!(%err, %entry_id, "failed to unload link");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn setup(&mut self, entry_id: LinkId) -> Result<(), MitmLightError> {
        let entry = self.entry(entry_id).ok_or_else(|| not_found(entry_id))?;
        match Link::setup(Arc::clone(&self.host), entry).await {
            Ok(link) => {
                self.links.insert(entry_id, link);
                Ok(())
            }
            Err(err) => {
                tracing::error!(%err, %entry_id, "failed to set up link");
                Err(err)
            }
        }
    }
}

fn not_found(entry_id: LinkId) -> MitmLightError {
    NotFoundError {
        entity: "ConfigEntry",
        id: entry_id.to_string(),
    }
    .into()
}
