//! Sentry backend

use std::sync::Arc;
use std::time::Duration;

use sentry::protocol::{Event, Exception, User};
use sentry::types::Dsn;
use sentry::{Client, ClientOptions, Hub, Level, Scope};

use super::{Connector, EntryKind, ErrorEntry, Identity, ReportBackend, ReportContext};
use crate::core::{InitError, ReportError};

/// Connects to Sentry using [`Identity::project`] as the DSN
#[derive(Debug, Clone, Copy, Default)]
pub struct SentryConnector;

impl Connector for SentryConnector {
    fn connect(&self, identity: &Identity) -> Result<Arc<dyn ReportBackend>, InitError> {
        let dsn: Dsn = identity
            .project
            .parse()
            .map_err(|e| InitError::InvalidIdentity {
                reason: format!("invalid DSN '{}': {e}", identity.project),
            })?;

        let client = Arc::new(Client::from_config(ClientOptions {
            dsn: Some(dsn),
            release: Some(identity.version.clone().into()),
            environment: identity.environment.clone().map(Into::into),
            attach_stacktrace: true,
            send_default_pii: false,
            transport: Some(Arc::new(sentry::transports::DefaultTransportFactory)),
            ..Default::default()
        }));

        if !client.is_enabled() {
            return Err(InitError::Unreachable {
                reason: "sentry client has no usable transport".to_string(),
            });
        }

        // Own hub: several clients may coexist in tests and must not leak
        // into the process-wide Sentry hub.
        let hub = Arc::new(Hub::new(Some(Arc::clone(&client)), Arc::new(Scope::default())));
        hub.configure_scope(|scope| scope.set_tag("service", &identity.service));

        tracing::debug!(service = %identity.service, release = %identity.version, "sentry client created");

        Ok(Arc::new(SentryBackend { client, hub }))
    }
}

/// Backend submitting entries as Sentry events
pub struct SentryBackend {
    client: Arc<Client>,
    hub: Arc<Hub>,
}

impl std::fmt::Debug for SentryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentryBackend")
            .field("enabled", &self.client.is_enabled())
            .finish_non_exhaustive()
    }
}

impl SentryBackend {
    fn capture(&self, event: Event<'static>) -> Result<(), ReportError> {
        let id = self.hub.capture_event(event);
        if id.is_nil() {
            return Err(ReportError::Rejected("event dropped by client".to_string()));
        }
        Ok(())
    }
}

impl ReportBackend for SentryBackend {
    fn submit_sync(
        &self,
        context: &ReportContext,
        entry: &ErrorEntry,
        deadline: Duration,
    ) -> Result<(), ReportError> {
        let mut event = to_event(entry);
        apply_context(&mut event, context);
        self.capture(event)?;

        if self.client.flush(Some(deadline)) {
            Ok(())
        } else {
            Err(ReportError::Timeout(deadline))
        }
    }

    fn submit_async(&self, entry: ErrorEntry) {
        if let Err(e) = self.capture(to_event(&entry)) {
            tracing::warn!(error = %e, "failed to queue error report");
        }
    }

    fn close(&self, deadline: Duration) -> Result<(), ReportError> {
        if self.client.close(Some(deadline)) {
            Ok(())
        } else {
            Err(ReportError::Timeout(deadline))
        }
    }
}

fn to_event(entry: &ErrorEntry) -> Event<'static> {
    let (level, ty) = match entry.kind {
        EntryKind::Error => (Level::Error, "error"),
        EntryKind::Panic => (Level::Fatal, "panic"),
    };

    // Sentry lists exceptions innermost first
    let mut exceptions: Vec<Exception> = entry
        .chain
        .iter()
        .rev()
        .map(|cause| Exception {
            ty: "cause".to_string(),
            value: Some(cause.clone()),
            ..Default::default()
        })
        .collect();
    exceptions.push(Exception {
        ty: ty.to_string(),
        value: Some(entry.message.clone()),
        ..Default::default()
    });

    let mut event = Event {
        level,
        message: Some(entry.message.clone()),
        logger: entry.logger.clone(),
        tags: entry.labels.clone(),
        exception: exceptions.into(),
        ..Default::default()
    };
    apply_context(&mut event, &entry.context);
    event
}

fn apply_context(event: &mut Event<'static>, context: &ReportContext) {
    if let Some(request_id) = &context.request_id {
        event.tags.insert("request_id".to_string(), request_id.clone());
    }
    if let Some(user_id) = &context.user_id {
        event.user = Some(User {
            id: Some(user_id.clone()),
            ..Default::default()
        });
    }
    for (key, value) in &context.fields {
        event.extra.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_invalid_dsn_is_rejected() {
        let identity = Identity::new("hepp", "test", "v1.0");
        let err = SentryConnector.connect(&identity).err().unwrap();
        assert!(matches!(err, InitError::InvalidIdentity { .. }));
    }

    #[test]
    fn test_well_formed_dsn_connects() {
        let identity = Identity::new("https://public@sentry.example.com/1", "svc", "v1.0")
            .with_environment("test");

        let backend = SentryConnector.connect(&identity).unwrap();

        assert!(backend.close(Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn test_event_carries_chain_labels_and_context() {
        let labels: BTreeMap<String, String> =
            [("one".to_string(), "1".to_string())].into_iter().collect();
        let entry = ErrorEntry {
            chain: vec!["inner cause".to_string()],
            ..ErrorEntry::panic("WOOT")
        }
        .with_logger("api")
        .with_labels(labels)
        .with_context(ReportContext::new().with_request_id("r-1").with_user_id("u-1"));

        let event = to_event(&entry);

        assert_eq!(event.level, Level::Fatal);
        assert_eq!(event.message.as_deref(), Some("WOOT"));
        assert_eq!(event.logger.as_deref(), Some("api"));
        assert_eq!(event.tags.get("one").map(String::as_str), Some("1"));
        assert_eq!(event.tags.get("request_id").map(String::as_str), Some("r-1"));
        assert_eq!(event.user.and_then(|u| u.id).as_deref(), Some("u-1"));

        let exceptions = &event.exception.values;
        assert_eq!(exceptions.len(), 2);
        assert_eq!(exceptions[0].value.as_deref(), Some("inner cause"));
        assert_eq!(exceptions[1].ty, "panic");
    }
}
