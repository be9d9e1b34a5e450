//! Checkpoint 2: Kraken's Quiz
//!
//! Three questions drawn from a shuffled pirate trivia bank. Two correct
//! answers pass; otherwise the quiz reshuffles and restarts after 3 s.

use super::{Lifecycle, Minigame, MinigameContext};
use crate::feedback::{Cue, Sound, vibration};
use crate::shuffle;

/// Questions asked per attempt
pub const QUESTIONS_PER_ATTEMPT: usize = 3;
/// Correct answers needed to pass
pub const REQUIRED_CORRECT: usize = 2;
/// Delay before a failed quiz restarts (ms)
pub const RETRY_DELAY_MS: u64 = 3_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub prompt: &'static str,
    pub options: [&'static str; 4],
    /// Index into `options`
    pub correct: usize,
}

pub const QUESTION_BANK: [Question; 5] = [
    Question {
        prompt: "What flag do pirates traditionally fly?",
        options: ["Jolly Roger", "Union Jack", "Stars and Stripes", "Tricolor"],
        correct: 0,
    },
    Question {
        prompt: "What is a pirate's favorite letter?",
        options: ["R", "P", "C", "Arrr"],
        correct: 2,
    },
    Question {
        prompt: "What do pirates call their ship's bathroom?",
        options: ["The head", "The stern", "The bow", "The galley"],
        correct: 0,
    },
    Question {
        prompt: "Which famous pirate was known as Blackbeard?",
        options: ["Captain Hook", "Edward Teach", "Anne Bonny", "Jack Sparrow"],
        correct: 1,
    },
    Question {
        prompt: "What is a pirate's weapon of choice?",
        options: ["Musket", "Cutlass", "Cannon", "Dagger"],
        correct: 1,
    },
];

#[derive(Debug)]
pub struct QuizGame {
    lc: Lifecycle,
    /// Bank indices in asking order
    order: Vec<usize>,
    current: usize,
    correct_answers: usize,
    selected: Option<usize>,
}

impl Default for QuizGame {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizGame {
    pub fn new() -> Self {
        Self {
            lc: Lifecycle::new(2),
            order: (0..QUESTION_BANK.len()).collect(),
            current: 0,
            correct_answers: 0,
            selected: None,
        }
    }

    /// Question being asked, `None` once the attempt is over
    pub fn current_question(&self) -> Option<&'static Question> {
        if self.current >= QUESTIONS_PER_ATTEMPT {
            return None;
        }
        self.order.get(self.current).map(|&i| &QUESTION_BANK[i])
    }

    pub fn correct_answers(&self) -> usize {
        self.correct_answers
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Choose an answer for the current question
    pub fn select_answer(&mut self, index: usize) -> bool {
        if !self.lc.accepts_input() || self.current_question().is_none() || index >= 4 {
            return false;
        }
        self.selected = Some(index);
        true
    }

    fn submit_answer(&mut self, now: u64) {
        let (Some(question), Some(answer)) = (self.current_question(), self.selected) else {
            return;
        };

        if answer == question.correct {
            self.correct_answers += 1;
            self.lc.cue(Cue::with_vibration(Sound::Correct, vibration::GOOD));
        } else {
            self.lc.cue(Cue::sound(Sound::Incorrect));
        }

        self.current += 1;
        self.selected = None;
        self.lc
            .set_progress(self.current as f32 / QUESTIONS_PER_ATTEMPT as f32 * 100.0);

        if self.current >= QUESTIONS_PER_ATTEMPT {
            if self.correct_answers >= REQUIRED_CORRECT {
                self.lc.succeed(Cue::SUCCESS);
            } else {
                self.lc.fail(
                    "Quiz failed! You need at least 2 correct answers.",
                    now,
                    RETRY_DELAY_MS,
                );
            }
        }
    }

    fn restart(&mut self, ctx: &mut MinigameContext<'_>) {
        self.current = 0;
        self.correct_answers = 0;
        self.selected = None;
        shuffle(&mut self.order, ctx.rng);
    }
}

impl Minigame for QuizGame {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lc
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lc
    }

    fn initialize(&mut self, ctx: &mut MinigameContext<'_>) {
        self.lc.activate();
        self.restart(ctx);
        self.lc.cue(Cue::sound(Sound::QuizStart));
    }

    /// Submit the selected answer (ignored with nothing selected)
    fn handle_action(&mut self, ctx: &mut MinigameContext<'_>) {
        if self.lc.accepts_input() && self.selected.is_some() {
            self.submit_answer(ctx.now);
        }
    }

    fn update(&mut self, ctx: &mut MinigameContext<'_>) {
        if self.lc.retry_due(ctx.now) {
            self.reset(ctx);
        }
    }

    fn reset(&mut self, ctx: &mut MinigameContext<'_>) {
        self.lc.reset();
        self.restart(ctx);
    }

    fn status_text(&self) -> String {
        match self.current_question() {
            Some(q) => format!(
                "Question {} of {}: {}",
                self.current + 1,
                QUESTIONS_PER_ATTEMPT,
                q.prompt
            ),
            None => format!(
                "{} of {} correct",
                self.correct_answers, QUESTIONS_PER_ATTEMPT
            ),
        }
    }
}
