pub mod file_report_generator;
pub mod jsonl_history_ledger;
