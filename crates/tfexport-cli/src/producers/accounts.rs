//! Producer for accounts and their secret placeholders

use super::{file_name, Slugs, ACCOUNT};
use crate::hcl::{Block, Value};
use crate::snapshot::{Account, Snapshot};
use async_trait::async_trait;
use std::sync::Arc;
use tfexport_pipeline::{Producer, ProducerError};
use tfexport_registry::{
    DummyVariable, ParameterType, ResourceDescriptor, ResourceParameter, ResourceRegistry,
};
use tracing::debug;

/// Exports accounts, replacing their secrets with placeholder variables
pub struct AccountProducer {
    snapshot: Arc<Snapshot>,
}

impl AccountProducer {
    pub fn new(snapshot: Arc<Snapshot>) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl Producer for AccountProducer {
    fn name(&self) -> &str {
        "accounts"
    }

    async fn populate(&self, registry: Arc<ResourceRegistry>) -> Result<(), ProducerError> {
        let mut slugs = Slugs::default();

        for account in &self.snapshot.accounts {
            if account.id.is_empty() {
                return Err(ProducerError::invalid(ACCOUNT, &account.name, "missing id"));
            }
            if account.account_type.is_empty() {
                return Err(ProducerError::invalid(ACCOUNT, &account.id, "missing account type"));
            }
            if registry.exists(ACCOUNT, &account.id) {
                continue;
            }

            // Only record the placeholder when this descriptor is the one kept.
            let slug = slugs.claim(&account.name);
            let secret = account.has_secret.then(|| format!("account_{slug}_secret"));
            if registry.insert([describe(account, &slug, secret.as_deref())]) == 1 {
                if let Some(variable) = secret {
                    registry.record_dummy(DummyVariable::new(variable, &account.name, ACCOUNT));
                }
            }
        }

        debug!(accounts = registry.count_of_type(ACCOUNT), "Accounts inserted");
        Ok(())
    }
}

fn describe(account: &Account, slug: &str, secret: Option<&str>) -> ResourceDescriptor {
    let mut text = Block::resource("deployment_account", slug)
        .attribute("name", Value::string(&account.name))
        .attribute("account_type", Value::string(&account.account_type))
        .optional("secret", secret.map(|v| Value::expression(format!("var.{v}"))))
        .render();

    let mut descriptor = ResourceDescriptor::new(&account.id, ACCOUNT)
        .with_name(&account.name)
        .with_lookup(format!("deployment_account.{slug}.id"))
        .with_dependency(format!("deployment_account.{slug}"))
        .with_file_name(file_name("account", slug));

    if let Some(variable) = secret {
        text.push('\n');
        text.push_str(
            &Block::variable(variable)
                .attribute("type", Value::expression("string"))
                .attribute("sensitive", Value::Bool(true))
                .render(),
        );
        descriptor = descriptor.with_parameter(
            ResourceParameter::new(variable, &account.name, ParameterType::Sensitive)
                .with_description(format!("Secret of account {}", account.name)),
        );
    }

    descriptor.with_render(move |_| Ok(text.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: &str, name: &str, has_secret: bool) -> Account {
        Account {
            id: id.into(),
            name: name.into(),
            account_type: "AzureServicePrincipal".into(),
            has_secret,
        }
    }

    #[tokio::test]
    async fn test_secret_becomes_dummy_variable_and_parameter() {
        let snapshot = Arc::new(Snapshot {
            accounts: vec![account("Accounts-1", "Azure", true), account("Accounts-2", "Token", false)],
            ..Default::default()
        });
        let registry = Arc::new(ResourceRegistry::new());

        AccountProducer::new(snapshot).populate(registry.clone()).await.unwrap();

        assert_eq!(
            registry.dummy_variables(),
            vec![DummyVariable::new("account_azure_secret", "Azure", ACCOUNT)]
        );
        let parameters = registry.parameters();
        assert_eq!(parameters.len(), 1);
        assert!(parameters[0].sensitive);
        assert_eq!(registry.resolve(ACCOUNT, "Accounts-2"), "deployment_account.token.id");
    }

    #[tokio::test]
    async fn test_rendered_account_references_variable() {
        let snapshot = Arc::new(Snapshot {
            accounts: vec![account("Accounts-1", "Azure", true)],
            ..Default::default()
        });
        let registry = Arc::new(ResourceRegistry::new());
        AccountProducer::new(snapshot).populate(registry.clone()).await.unwrap();

        let jobs = registry.render_jobs();
        let text = (jobs[0].render)(registry.as_ref()).unwrap();

        assert!(text.contains("secret       = var.account_azure_secret"));
        assert!(text.contains("variable \"account_azure_secret\""));
        assert_eq!(jobs[0].file_name, "account_azure.tf");
    }

    #[tokio::test]
    async fn test_missing_account_type_is_invalid() {
        let mut bad = account("Accounts-1", "Azure", false);
        bad.account_type.clear();
        let snapshot = Arc::new(Snapshot {
            accounts: vec![bad],
            ..Default::default()
        });

        let err = AccountProducer::new(snapshot)
            .populate(Arc::new(ResourceRegistry::new()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing account type"));
    }
}
