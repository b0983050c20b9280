pub const CONTINUE_PROMPT: &str = "please continue your answer";

pub fn source_urls_prompt(question: &str, max_urls: usize) -> String {
    format!(
        "Given the following question, provide ONLY a JSON list of specific URLs (maximum {max_urls}) \
that would contain the information needed to answer it. Do not answer the question itself, \
only provide sources.

Question: {question}

Respond with only a JSON array of URLs, nothing else."
    )
}

pub fn answer_prompt(question: &str, context: &str) -> String {
    format!(
        "Using ONLY the following context, answer this question: {question}

Context:
{context}

Provide a clear, concise answer based solely on the context provided."
    )
}
