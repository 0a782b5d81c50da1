use super::errors::ManagerError;
use super::models::StorageManager;
use arstore_events::AppEvent;
use arstore_models::{CompanyId, ProvisionedPath, RoutingKey};

type Result<T> = std::result::Result<T, ManagerError>;

impl StorageManager {
    /// Provisions `{company}/{category}/{order}/{subfolder}` on the configured
    /// provisioning routing key. See [`provision_hierarchy_on`](Self::provision_hierarchy_on).
    pub async fn provision_hierarchy(
        &self,
        company_id: CompanyId,
        company_slug: &str,
        category_slug: &str,
        order_id: &str,
        subfolders: &[String],
    ) -> Result<ProvisionedPath> {
        let routing_key = self.config.current().provisioning.routing_key.clone();
        self.provision_hierarchy_on(
            company_id,
            &routing_key,
            company_slug,
            category_slug,
            order_id,
            subfolders,
        )
        .await
    }

    /// Ensures the order folder and its subfolders exist on the backend
    /// `routing_key` resolves to for this company.
    ///
    /// Empty `subfolders` means the configured defaults for that backend kind.
    /// Returns the first subfolder's path, or the order path when there are none.
    pub async fn provision_hierarchy_on(
        &self,
        company_id: CompanyId,
        routing_key: &RoutingKey,
        company_slug: &str,
        category_slug: &str,
        order_id: &str,
        subfolders: &[String],
    ) -> Result<ProvisionedPath> {
        let order_path = ProvisionedPath::from_segments([company_slug, category_slug, order_id])?;
        let handle = self.get_adapter(company_id, routing_key).await?;

        let subfolders = if subfolders.is_empty() {
            self.config
                .current()
                .provisioning
                .subfolders_for(handle.kind())
                .to_vec()
        } else {
            subfolders.to_vec()
        };

        let leaves = if subfolders.is_empty() {
            vec![order_path.clone()]
        } else {
            subfolders
                .iter()
                .map(|name| order_path.join(name))
                .collect::<std::result::Result<Vec<_>, _>>()?
        };

        self.remember_slug(company_id, company_slug);
        let created = self.provisioner.ensure(&handle, company_slug, &leaves).await?;

        tracing::debug!(
            company = %company_id,
            routing_key = %routing_key,
            backend = %handle.kind(),
            path = %order_path,
            created,
            outcome = "ok",
            "provision_hierarchy"
        );

        if subfolders.is_empty() {
            Ok(order_path)
        } else {
            Ok(leaves.into_iter().next().unwrap_or(order_path))
        }
    }

    /// Creates the company root and one folder per configured category on
    /// the provisioning routing key. Returns the number of categories.
    pub async fn provision_company(&self, company_id: CompanyId) -> Result<usize> {
        let document = self.config.current();
        let profile = document
            .company(company_id)
            .ok_or(ManagerError::CompanyNotFound(company_id))?;

        let root = ProvisionedPath::from_segments([profile.slug.as_str()])?;
        let mut leaves = Vec::with_capacity(profile.categories.len().max(1));
        for category in &profile.categories {
            leaves.push(root.join(category)?);
        }
        if leaves.is_empty() {
            leaves.push(root);
        }

        let handle = self
            .get_adapter(company_id, &document.provisioning.routing_key)
            .await?;
        self.remember_slug(company_id, &profile.slug);
        self.provisioner.ensure(&handle, &profile.slug, &leaves).await?;

        self.events.emit(AppEvent::CompanyProvisioned {
            slug: profile.slug.clone(),
            categories: profile.categories.len(),
        });
        Ok(profile.categories.len())
    }

    /// Provisions every configured company (partial success: failures are logged)
    pub async fn provision_all_companies(&self) -> Vec<(CompanyId, ManagerError)> {
        let document = self.config.current();
        let ids: Vec<CompanyId> = document.companies.iter().map(|c| c.id).collect();

        let results =
            futures::future::join_all(ids.iter().map(|id| self.provision_company(*id))).await;

        let mut failures = Vec::new();
        for (id, result) in ids.into_iter().zip(results) {
            if let Err(e) = result {
                self.events.emit(AppEvent::Error {
                    context: format!("Provisioning company {}", id),
                    error: e.to_string(),
                });
                failures.push((id, e));
            }
        }

        if failures.is_empty() {
            self.events.emit(AppEvent::AllCompaniesProvisioned);
        }
        failures
    }
}
