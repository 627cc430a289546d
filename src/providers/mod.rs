pub mod airtable;
pub mod openai;
pub mod search;
