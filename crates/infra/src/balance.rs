//! Balance calculator.
//!
//! Derives the dashboard figures for a [`BalanceFilter`] from whatever
//! [`LedgerStore`] it is handed. The calculator owns no state of its own:
//! each call issues one aggregate query per [`Movement`] and combines the
//! results with [`BalanceReport::from_totals`].

use tracing::debug;

use armory_ledger::{BalanceFilter, BalanceReport, Movement, MovementTotals};

use crate::ledger_store::{LedgerStore, StoreError};

#[derive(Debug, Clone)]
pub struct BalanceCalculator<S> {
    store: S,
}

impl<S> BalanceCalculator<S>
where
    S: LedgerStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The five raw totals. Reads are not isolated from concurrent appends.
    pub async fn totals(&self, filter: &BalanceFilter) -> Result<MovementTotals, StoreError> {
        let mut totals = MovementTotals::default();
        for movement in Movement::ALL {
            let total = self.store.sum(movement, filter).await?;
            totals.set(movement, total);
        }
        debug!(?filter, ?totals, "balance totals computed");
        Ok(totals)
    }

    pub async fn report(&self, filter: &BalanceFilter) -> Result<BalanceReport, StoreError> {
        let totals = self.totals(filter).await?;
        Ok(BalanceReport::from_totals(&totals))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use armory_core::{AssetTypeId, BaseId};
    use armory_ledger::{
        AssetType, Assignment, Base, Expenditure, LedgerEntry, NewAssignment, NewExpenditure, NewPurchase, NewTransfer, Purchase,
        Transfer,
    };

    use super::*;
    use crate::ledger_store::{DirectoryStore, InMemoryLedgerStore};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    struct Fixture {
        store: Arc<InMemoryLedgerStore>,
        a: BaseId,
        b: BaseId,
        rifle: AssetTypeId,
    }

    /// Base A: purchase 100, transfer 30 to B, assign 20. All on one day.
    async fn scenario() -> Fixture {
        let store = Arc::new(InMemoryLedgerStore::new());
        let a = store.create_base(Base::register("Alpha").unwrap()).await.unwrap().id;
        let b = store.create_base(Base::register("Bravo").unwrap()).await.unwrap().id;
        let rifle = store
            .create_asset_type(AssetType::register("Rifle").unwrap())
            .await
            .unwrap()
            .id;

        let date = d("2024-03-10");
        let entries: [LedgerEntry; 3] = [
            Purchase::record(NewPurchase { base: a, asset_type: rifle, quantity: 100, date })
                .unwrap()
                .into(),
            Transfer::record(NewTransfer { from_base: a, to_base: b, asset_type: rifle, quantity: 30, date })
                .unwrap()
                .into(),
            Assignment::record(NewAssignment {
                personnel_name: "Sgt. Ortiz".to_string(),
                base: a,
                asset_type: rifle,
                quantity: 20,
                date,
            })
            .unwrap()
            .into(),
        ];
        for entry in entries {
            store.append(entry).await.unwrap();
        }

        Fixture { store, a, b, rifle }
    }

    #[tokio::test]
    async fn source_base_report() {
        let f = scenario().await;
        let calc = BalanceCalculator::new(f.store.clone());

        let report = calc
            .report(&BalanceFilter { base: Some(f.a), ..Default::default() })
            .await
            .unwrap();

        assert_eq!(report.opening_balance, 0);
        assert_eq!(report.net_movement, 70);
        assert_eq!(report.assigned, 20);
        assert_eq!(report.expended, 0);
        assert_eq!(report.closing_balance, 50);
    }

    #[tokio::test]
    async fn destination_base_report() {
        let f = scenario().await;
        let calc = BalanceCalculator::new(f.store.clone());

        let report = calc
            .report(&BalanceFilter { base: Some(f.b), asset_type: Some(f.rifle), ..Default::default() })
            .await
            .unwrap();

        assert_eq!(report.net_movement, 30);
        assert_eq!(report.closing_balance, 30);
    }

    #[tokio::test]
    async fn empty_ledger_reports_zero() {
        let calc = BalanceCalculator::new(Arc::new(InMemoryLedgerStore::new()));
        let totals = calc.totals(&BalanceFilter::default()).await.unwrap();
        assert_eq!(totals, MovementTotals::default());
        assert_eq!(calc.report(&BalanceFilter::default()).await.unwrap().closing_balance, 0);
    }

    #[tokio::test]
    async fn date_window_is_inclusive() {
        let f = scenario().await;
        let expenditure = Expenditure::record(NewExpenditure {
            base: f.a,
            asset_type: f.rifle,
            quantity: 5,
            date: d("2024-03-20"),
            reason: String::new(),
        })
        .unwrap();
        f.store.append(expenditure.into()).await.unwrap();
        let calc = BalanceCalculator::new(f.store.clone());

        let on_bounds = BalanceFilter {
            base: Some(f.a),
            date_from: Some(d("2024-03-10")),
            date_to: Some(d("2024-03-20")),
            ..Default::default()
        };
        let report = calc.report(&on_bounds).await.unwrap();
        assert_eq!(report.expended, 5);
        assert_eq!(report.closing_balance, 45);

        let before = BalanceFilter { date_to: Some(d("2024-03-09")), ..on_bounds };
        assert_eq!(calc.totals(&before).await.unwrap(), MovementTotals::default());

        let after_first_day = BalanceFilter { date_from: Some(d("2024-03-11")), ..on_bounds };
        let totals = calc.totals(&after_first_day).await.unwrap();
        assert_eq!(totals.purchased, 0);
        assert_eq!(totals.expended, 5);
    }

    #[tokio::test]
    async fn unfiltered_transfers_cancel_out() {
        let f = scenario().await;
        let calc = BalanceCalculator::new(f.store.clone());

        let totals = calc.totals(&BalanceFilter::default()).await.unwrap();
        assert_eq!(totals.transferred_in, 30);
        assert_eq!(totals.transferred_out, 30);
        assert_eq!(totals.net_movement(), 100);
    }
}
