/// Builds the single instruction prompt sent to the generation backend.
///
/// The prompt embeds the retrieval context verbatim, the requested question
/// count, one bullet per already-asked question, and the strict output-format
/// rules the response parser relies on.
pub fn build_quiz_prompt(
    context: &str,
    num_questions: usize,
    asked_questions: &[String],
) -> String {
    let asked_questions_str = asked_questions
        .iter()
        .map(|q| format!("- {}", q))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an expert AI Trainer. Based ONLY on the following context, generate {num_questions} multiple-choice questions.\n\
        DO NOT ask any of the following questions that have already been asked:\n\
        {asked_questions_str}\n\
        \n\
        Context:\n\
        ---\n\
        {context}\n\
        ---\n\
        \n\
        Rules for the output:\n\
        1. The questions must be directly answerable from the provided context.\n\
        2. Provide 4 options (A, B, C, D) for each question. The 'options' key MUST be an object.\n\
        3. Specify the correct answer and a \"reference\" sentence from the context.\n\
        4. Your final output MUST be a single, valid JSON object with a key \"questions\"."
    )
}
