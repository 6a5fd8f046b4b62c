use crate::{Calculator, Decision, Error, ExpectedValues, Expectations, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Dealer up cards in chart order, Ace last.
pub const DEALER_UP_CARDS: [u8; 10] = [2, 3, 4, 5, 6, 7, 8, 9, 10, 1];

/// A row of a strategy chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TableRow {
    Hard(u8),
    /// An Ace with the other card.
    Soft(u8),
    Pair(u8),
}

impl TableRow {
    /// Every row of a full chart: hard 5 to 18, soft A2 to A9, then the pairs.
    pub fn all() -> Vec<TableRow> {
        (5..=18)
            .map(TableRow::Hard)
            .chain((2..=9).map(TableRow::Soft))
            .chain((2..=10).map(TableRow::Pair))
            .chain(std::iter::once(TableRow::Pair(1)))
            .collect()
    }

    /// The two cards representing the row.
    pub fn cards(&self) -> [u8; 2] {
        match *self {
            TableRow::Hard(total) if total <= 12 => [2, total - 2],
            TableRow::Hard(total) => [10, total - 10],
            TableRow::Soft(other) => [1, other],
            TableRow::Pair(rank) => [rank, rank],
        }
    }

    pub fn label(&self) -> String {
        match *self {
            TableRow::Hard(total) => format!("{}", total),
            TableRow::Soft(other) => format!("A{}", other),
            TableRow::Pair(1) => String::from("AA"),
            TableRow::Pair(10) => String::from("TT"),
            TableRow::Pair(rank) => format!("{}{}", rank, rank),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StrategyCell {
    pub dealer_up_card: u8,
    pub decision: Decision,
    pub expected_values: ExpectedValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyRow {
    pub row: TableRow,
    pub cells: Vec<StrategyCell>,
}

/// Best decisions for the initial hands against every up card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyTable {
    pub rules: String,
    pub recursion_depth: usize,
    pub rows: Vec<StrategyRow>,
}

impl StrategyTable {
    /// Computes the full chart. `number_of_threads == 0` uses all available cores.
    pub fn compute(calculator: &Calculator, number_of_threads: usize) -> Result<Self> {
        Self::for_rows(calculator, &TableRow::all(), number_of_threads)
    }

    pub fn for_rows(
        calculator: &Calculator,
        rows: &[TableRow],
        number_of_threads: usize,
    ) -> Result<Self> {
        let number_of_threads = {
            if number_of_threads == 0 {
                let parallelism = std::thread::available_parallelism();
                match parallelism {
                    Ok(n) => n.get(),
                    Err(_) => 1,
                }
            } else {
                number_of_threads
            }
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(number_of_threads)
            .build()
            .map_err(|e| Error::ThreadPool(e.to_string()))?;
        info!(
            rows = rows.len(),
            number_of_threads,
            rules = %calculator.rules(),
            "computing strategy table"
        );

        // The calculator's cache is shared, so cells reuse each other's dealer tables.
        let rows = pool.install(|| {
            rows.par_iter()
                .map(|row| Self::compute_row(calculator, *row))
                .collect::<Result<Vec<_>>>()
        })?;

        info!(
            dealer_tables = calculator.cache().computed_tables(),
            "strategy table done"
        );
        Ok(StrategyTable {
            rules: calculator.rules().to_string(),
            recursion_depth: calculator.depth(),
            rows,
        })
    }

    fn compute_row(calculator: &Calculator, row: TableRow) -> Result<StrategyRow> {
        let cells = DEALER_UP_CARDS
            .as_slice()
            .par_iter()
            .map(|dealer_up_card| {
                let expected_values = calculator.compute_ev(&row.cards(), *dealer_up_card)?;
                let decision = match expected_values.best() {
                    Some((decision, _)) => decision,
                    None => Decision::Stand,
                };
                Ok(StrategyCell {
                    dealer_up_card: *dealer_up_card,
                    decision,
                    expected_values,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(StrategyRow { row, cells })
    }

    pub fn get(&self, row: TableRow, dealer_up_card: u8) -> Option<&StrategyCell> {
        self.rows
            .iter()
            .find(|r| r.row == row)?
            .cells
            .iter()
            .find(|cell| cell.dealer_up_card == dealer_up_card)
    }
}

impl fmt::Display for StrategyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}, depth {}", self.rules, self.recursion_depth)?;
        write!(f, "    ")?;
        for dealer_up_card in DEALER_UP_CARDS {
            match dealer_up_card {
                1 => write!(f, " A")?,
                10 => write!(f, " T")?,
                n => write!(f, " {}", n)?,
            }
        }
        writeln!(f)?;
        for row in &self.rows {
            write!(f, "{:>4}", row.row.label())?;
            for cell in &row.cells {
                write!(f, " {}", cell.decision.to_char())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
