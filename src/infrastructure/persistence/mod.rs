pub mod postgres_ledger;
