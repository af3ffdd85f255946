// derp/src/pipeline/schedule.rs

//! Resolves a pipeline's order list into the typed schedule an `apply` call
//! executes. The terminal reduce is moved to the end; the pipeline's own order
//! list is not touched.

use crate::core::element::Element;
use crate::core::instruction::{Action, Combiner, InstructionKind, Order, Predicate, Transform};
use crate::pipeline::definition::Pipeline;

/// One resolved step, borrowing its closure from the pipeline.
pub(crate) enum Instruction<'p, T> {
  Filter(&'p Predicate<T>),
  Map(&'p Transform<T>),
  Foreach(&'p Action<T>),
  Reduce(&'p Combiner<T>),
  Skip(usize),
  Take(usize),
}

impl<T> Instruction<'_, T> {
  pub(crate) fn kind(&self) -> InstructionKind {
    match self {
      Instruction::Filter(_) => InstructionKind::Filter,
      Instruction::Map(_) => InstructionKind::Map,
      Instruction::Foreach(_) => InstructionKind::Foreach,
      Instruction::Reduce(_) => InstructionKind::Reduce,
      Instruction::Skip(_) => InstructionKind::Skip,
      Instruction::Take(_) => InstructionKind::Take,
    }
  }
}

/// A resolved instruction together with the order record it came from.
pub(crate) struct Scheduled<'p, T> {
  pub(crate) order: &'p Order,
  pub(crate) instruction: Instruction<'p, T>,
}

impl<T: Element> Pipeline<T> {
  /// Builds the execution schedule: declaration order, reduce last.
  pub(crate) fn resolve_schedule(&self) -> Vec<Scheduled<'_, T>> {
    let mut schedule = Vec::with_capacity(self.orders.len());
    let mut terminal = None;

    for order in &self.orders {
      let instruction = match order.kind {
        InstructionKind::Filter => self.filters.get(order.index).map(Instruction::Filter),
        InstructionKind::Map => self.mappers.get(order.index).map(Instruction::Map),
        InstructionKind::Foreach => self.foreachers.get(order.index).map(Instruction::Foreach),
        InstructionKind::Reduce => self.reducer.as_ref().map(Instruction::Reduce),
        InstructionKind::Skip => self.skip_counts.get(order.index).copied().map(Instruction::Skip),
        InstructionKind::Take => self.take_counts.get(order.index).copied().map(Instruction::Take),
      };
      // Registration keeps storage and orders in lockstep, so a miss cannot happen.
      let Some(instruction) = instruction else {
        continue;
      };

      let scheduled = Scheduled { order, instruction };
      if order.kind == InstructionKind::Reduce {
        terminal = Some(scheduled);
      } else {
        schedule.push(scheduled);
      }
    }

    schedule.extend(terminal);
    schedule
  }
}

#[cfg(test)]
mod tests {
  use crate::core::instruction::InstructionKind;
  use crate::pipeline::definition::Pipeline;

  fn kinds(p: &Pipeline<i32>) -> Vec<InstructionKind> {
    p.resolve_schedule().iter().map(|s| s.instruction.kind()).collect()
  }

  #[test]
  fn reduce_is_scheduled_last_without_touching_orders() {
    let mut p = Pipeline::<i32>::new();
    p.filter(|v| *v > 0, &[]);
    p.reduce(|a, b| a + b, &["sum"]).unwrap();
    p.map(|_, v| *v *= 2, &[]);
    p.take(2).unwrap();

    assert_eq!(
      kinds(&p),
      vec![
        InstructionKind::Filter,
        InstructionKind::Map,
        InstructionKind::Take,
        InstructionKind::Reduce
      ]
    );
    // Registration order is untouched.
    assert_eq!(p.orders()[1].kind, InstructionKind::Reduce);
    // Resolving twice is idempotent.
    assert_eq!(kinds(&p).last(), Some(&InstructionKind::Reduce));
  }

  #[test]
  fn skip_and_take_carry_their_counts() {
    let mut p = Pipeline::<i32>::new();
    p.skip(3).unwrap();
    p.take(1).unwrap();
    p.skip(2).unwrap();
    let counts: Vec<(InstructionKind, usize)> = p
      .resolve_schedule()
      .iter()
      .filter_map(|s| match s.instruction {
        super::Instruction::Skip(n) => Some((InstructionKind::Skip, n)),
        super::Instruction::Take(n) => Some((InstructionKind::Take, n)),
        _ => None,
      })
      .collect();
    assert_eq!(
      counts,
      vec![
        (InstructionKind::Skip, 3),
        (InstructionKind::Take, 1),
        (InstructionKind::Skip, 2)
      ]
    );
  }
}
