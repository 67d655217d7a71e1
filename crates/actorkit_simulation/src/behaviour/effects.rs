//! Effect Application Sequence — explicit resumable task вместо корутины
//!
//! Behaviour система опрашивает sequence каждый тик:
//! - до resume_at → Pending
//! - иначе следующий influence (порядок объявления), потом пауза
//! - после последнего → completion_delay → Finished

/// Шаг последовательности
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStep {
    Pending,
    /// Применить influence с этим индексом
    Apply(usize),
    Finished,
}

/// Прогресс применения hit influences
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectSequence {
    /// Не продолжать раньше этого времени
    pub resume_at: f32,
    pub next_index: usize,
}

impl EffectSequence {
    pub fn start(now: f32, time_until_effect: f32) -> Self {
        Self {
            resume_at: now + time_until_effect,
            next_index: 0,
        }
    }

    /// Опросить последовательность из `count` influences
    ///
    /// После Apply следующий шаг возможен не раньше следующего тика
    /// (`interval` добавляется сверху), после последнего — через `completion_delay`.
    pub fn poll(&mut self, now: f32, count: usize, interval: f32, completion_delay: f32) -> SequenceStep {
        if now < self.resume_at {
            return SequenceStep::Pending;
        }

        if self.is_exhausted(count) {
            return SequenceStep::Finished;
        }

        let index = self.next_index;
        self.next_index += 1;
        self.resume_at = if self.next_index < count {
            now + interval
        } else {
            now + completion_delay
        };

        SequenceStep::Apply(index)
    }

    /// Все `count` influences уже выданы
    pub fn is_exhausted(&self, count: usize) -> bool {
        self.next_index >= count
    }
}
