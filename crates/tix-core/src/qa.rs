//! Q&A-driven content generation.
//!
//! The engine asks the model for up to N clarifying questions, collects one
//! answer per question in order, folds topic + answers into a final prompt,
//! and asks the model once more for the draft.
//!
//! ```text
//! GenerationContext ─► generate_questions ─► collect_answer × N ─► build_final_prompt ─► draft
//! ```

use crate::error::Result;
use crate::generation::Generator;
use crate::prompts::{self, ContentKind};
use crate::types::{AnswerPair, GenerationContext, Question};
use std::collections::VecDeque;
use std::io::{BufRead, Write};

// ---------------------------------------------------------------------------
// InputMethod
// ---------------------------------------------------------------------------

/// Where answers come from.
pub enum InputMethod<'a> {
    /// Print each question to `output`, then block on one line of `input`.
    /// A blank line (or end of input) is a blank answer.
    Interactive {
        input: &'a mut dyn BufRead,
        output: &'a mut dyn Write,
    },
    /// Answers supplied up front, consumed in question order. Questions past
    /// the end get blank answers.
    Structured(VecDeque<String>),
}

impl<'a> InputMethod<'a> {
    pub fn interactive(input: &'a mut dyn BufRead, output: &'a mut dyn Write) -> Self {
        InputMethod::Interactive { input, output }
    }

    pub fn structured<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        InputMethod::Structured(answers.into_iter().map(Into::into).collect())
    }
}

// ---------------------------------------------------------------------------
// QuestionEngine
// ---------------------------------------------------------------------------

pub struct QuestionEngine<'g> {
    generator: &'g dyn Generator,
    kind: ContentKind,
}

impl<'g> QuestionEngine<'g> {
    pub fn new(generator: &'g dyn Generator, kind: ContentKind) -> Self {
        Self { generator, kind }
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Ask the model for at most `max_questions` questions. Zero skips the
    /// call entirely. A shorter list is used as returned.
    pub fn generate_questions(
        &self,
        ctx: &GenerationContext,
        max_questions: usize,
    ) -> Result<Vec<Question>> {
        if max_questions == 0 {
            return Ok(Vec::new());
        }
        let prompt = prompts::question_prompt(ctx, self.kind, max_questions);
        let raw = self.generator.generate_questions(&prompt)?;
        let questions: Vec<Question> = raw
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .take(max_questions)
            .enumerate()
            .map(|(i, text)| Question {
                ordinal: i + 1,
                text,
            })
            .collect();
        tracing::debug!(count = questions.len(), max_questions, "questions generated");
        Ok(questions)
    }

    /// Collect the answer to one question.
    pub fn collect_answer(&self, question: &Question, input: &mut InputMethod<'_>) -> Result<AnswerPair> {
        let answer = match input {
            InputMethod::Interactive { input, output } => {
                writeln!(output, "\n{}. {}", question.ordinal, question.text)?;
                write!(output, "> ")?;
                output.flush()?;
                let mut line = String::new();
                input.read_line(&mut line)?;
                line.trim().to_string()
            }
            InputMethod::Structured(answers) => answers
                .pop_front()
                .map(|a| a.trim().to_string())
                .unwrap_or_default(),
        };
        Ok(AnswerPair {
            question: question.text.clone(),
            answer,
        })
    }

    /// Deterministic: identical inputs give a byte-identical prompt.
    pub fn build_final_prompt(&self, ctx: &GenerationContext, answers: &[AnswerPair]) -> String {
        prompts::final_prompt(ctx, self.kind, answers)
    }

    /// Run the question phase only. If the model cannot produce questions the
    /// flow continues with none.
    pub fn ask(
        &self,
        ctx: &GenerationContext,
        max_questions: usize,
        input: &mut InputMethod<'_>,
    ) -> Result<Vec<AnswerPair>> {
        let questions = match self.generate_questions(ctx, max_questions) {
            Ok(q) => q,
            Err(e) => {
                tracing::warn!(error = %e, "could not generate questions; continuing without");
                Vec::new()
            }
        };
        if questions.is_empty() && max_questions > 0 {
            tracing::warn!("no clarifying questions; generating directly");
        }
        questions
            .iter()
            .map(|q| self.collect_answer(q, input))
            .collect()
    }

    /// Generate the draft from collected answers, trimmed.
    pub fn draft(&self, ctx: &GenerationContext, answers: &[AnswerPair]) -> Result<String> {
        let prompt = self.build_final_prompt(ctx, answers);
        let content = self.generator.generate_content(&prompt)?;
        Ok(content.trim().to_string())
    }

    pub fn run_flow(
        &self,
        ctx: &GenerationContext,
        max_questions: usize,
        input: &mut InputMethod<'_>,
    ) -> Result<String> {
        let answers = self.ask(ctx, max_questions, input)?;
        self.draft(ctx, &answers)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TixError;
    use crate::fake::FakeGenerator;
    use std::io::Cursor;

    fn ctx() -> GenerationContext {
        GenerationContext::new("Add SSO login")
    }

    #[test]
    fn zero_questions_skips_the_generator() {
        let gen = FakeGenerator::new();
        let engine = QuestionEngine::new(&gen, ContentKind::Description);
        let questions = engine.generate_questions(&ctx(), 0).unwrap();
        assert!(questions.is_empty());
        assert_eq!(gen.question_calls(), 0);
    }

    #[test]
    fn questions_are_capped_and_numbered() {
        let gen = FakeGenerator::new().with_questions(["A?", " ", "B?", "C?"]);
        let engine = QuestionEngine::new(&gen, ContentKind::Description);
        let questions = engine.generate_questions(&ctx(), 2).unwrap();
        assert_eq!(
            questions,
            vec![
                Question { ordinal: 1, text: "A?".into() },
                Question { ordinal: 2, text: "B?".into() },
            ]
        );
        assert_eq!(gen.question_calls(), 1);
    }

    #[test]
    fn fewer_questions_than_requested_are_used_as_is() {
        let gen = FakeGenerator::new().with_questions(["Only one?"]);
        let engine = QuestionEngine::new(&gen, ContentKind::Description);
        assert_eq!(engine.generate_questions(&ctx(), 5).unwrap().len(), 1);
    }

    #[test]
    fn spike_context_uses_spike_template() {
        let gen = FakeGenerator::new().with_questions(["Q?"]);
        let engine = QuestionEngine::new(&gen, ContentKind::Description);
        engine
            .generate_questions(&GenerationContext::new("SPIKE: queues"), 3)
            .unwrap();
        assert!(gen.prompts()[0].contains("research spike"));
    }

    #[test]
    fn generator_failure_is_generation_error() {
        let gen = FakeGenerator::new().failing_questions("quota exceeded");
        let engine = QuestionEngine::new(&gen, ContentKind::Description);
        let err = engine.generate_questions(&ctx(), 3).unwrap_err();
        assert!(matches!(err, TixError::Generation(_)));
    }

    #[test]
    fn interactive_answers_read_lines_in_order() {
        let gen = FakeGenerator::new();
        let engine = QuestionEngine::new(&gen, ContentKind::Description);
        let mut input = Cursor::new("Okta\n\n");
        let mut output = Vec::new();
        let mut method = InputMethod::interactive(&mut input, &mut output);

        let q1 = Question { ordinal: 1, text: "Which IdP?".into() };
        let q2 = Question { ordinal: 2, text: "Deadline?".into() };
        let a1 = engine.collect_answer(&q1, &mut method).unwrap();
        let a2 = engine.collect_answer(&q2, &mut method).unwrap();
        let a3 = engine.collect_answer(&q2, &mut method).unwrap();

        assert_eq!(a1.answer, "Okta");
        assert_eq!(a2.answer, "");
        assert_eq!(a3.answer, "", "end of input is a blank answer");
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("1. Which IdP?"));
        assert!(shown.contains("2. Deadline?"));
    }

    #[test]
    fn structured_answers_pad_with_blanks() {
        let gen = FakeGenerator::new();
        let engine = QuestionEngine::new(&gen, ContentKind::Description);
        let mut method = InputMethod::structured(["yes"]);
        let q = Question { ordinal: 1, text: "Q?".into() };
        assert_eq!(engine.collect_answer(&q, &mut method).unwrap().answer, "yes");
        assert_eq!(engine.collect_answer(&q, &mut method).unwrap().answer, "");
    }

    #[test]
    fn final_prompt_is_deterministic() {
        let gen = FakeGenerator::new();
        let engine = QuestionEngine::new(&gen, ContentKind::Epic);
        let answers = vec![AnswerPair {
            question: "Scope?".into(),
            answer: "Web only".into(),
        }];
        let mut c = ctx();
        c.existing_content = Some("Old text".into());
        assert_eq!(
            engine.build_final_prompt(&c, &answers),
            engine.build_final_prompt(&c, &answers)
        );
    }

    #[test]
    fn run_flow_threads_answers_into_final_prompt() {
        let gen = FakeGenerator::new()
            .with_questions(["Which IdP?", "Mobile too?"])
            .with_content("\n  ## Summary\nDo SSO.  \n");
        let engine = QuestionEngine::new(&gen, ContentKind::Description);
        let mut method = InputMethod::structured(["Okta", "No"]);

        let draft = engine.run_flow(&ctx(), 4, &mut method).unwrap();

        assert_eq!(draft, "## Summary\nDo SSO.");
        let prompts = gen.prompts();
        assert_eq!(prompts.len(), 2);
        let final_prompt = &prompts[1];
        let q1 = final_prompt.find("Q1: Which IdP?").unwrap();
        let q2 = final_prompt.find("Q2: Mobile too?").unwrap();
        assert!(q1 < q2);
        assert!(final_prompt.contains("A1: Okta"));
        assert!(final_prompt.contains("A2: No"));
    }

    #[test]
    fn run_flow_survives_question_failure() {
        let gen = FakeGenerator::new()
            .failing_questions("boom")
            .with_content("draft");
        let engine = QuestionEngine::new(&gen, ContentKind::Description);
        let mut method = InputMethod::structured(Vec::<String>::new());
        assert_eq!(engine.run_flow(&ctx(), 3, &mut method).unwrap(), "draft");
    }

    #[test]
    fn run_flow_propagates_final_failure() {
        let gen = FakeGenerator::new().failing_content("service unavailable");
        let engine = QuestionEngine::new(&gen, ContentKind::Description);
        let mut method = InputMethod::structured(Vec::<String>::new());
        let err = engine.run_flow(&ctx(), 0, &mut method).unwrap_err();
        assert!(matches!(err, TixError::Generation(ref m) if m.contains("service unavailable")));
    }
}
