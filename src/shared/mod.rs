pub mod llm;
pub mod prompts;
pub mod validation;

#[cfg(test)]
pub mod test_helpers;
