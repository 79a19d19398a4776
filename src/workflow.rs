// Workflow layer: the pure logic behind the two commands. No IO happens
// here; the session loop prints the questions and lines these functions
// produce and performs the persist effect when one is requested.

use crate::api::FoodItem;

/// Question printed when the logging workflow starts.
pub const FOOD_PROMPT: &str = "What do you like to log today? ";

/// Question printed once a food has been matched.
pub const SERVING_PROMPT: &str =
    "How many servings did you eat? (as a decimal: 1, 0.5, 1.25 etc...) ->>> ";

/// Lazily filter `catalog` down to the items whose dietary preferences
/// contain `tag`, preserving catalog order.
pub fn filter_by_tag<'a>(
    catalog: &'a [FoodItem],
    tag: &'a str,
) -> impl Iterator<Item = &'a FoodItem> {
    catalog
        .iter()
        .filter(move |food| food.dietary_preferences.iter().any(|p| p == tag))
}

/// Exact calorie count for a serving: base calories times serving size.
/// Rounding is a display concern only.
pub fn compute_calories(food: &FoodItem, serving_size: f64) -> f64 {
    food.calories * serving_size
}

/// The logging prompt sequence as an explicit state machine:
/// `AwaitingFoodName -> AwaitingServingSize -> Finished`, with a
/// cancelled terminal reachable from the serving-size question.
///
/// The machine owns the catalog fetched for this run and is driven by
/// `feed`, one input line per call. Each call returns a [`Step`] telling
/// the caller what to print and whether to persist a log entry; once
/// [`question`](LogWorkflow::question) returns `None` the machine is
/// terminal and the session loop takes over again. Driving the machine
/// to a terminal state before reading the next command is what rules
/// out a second `log` starting mid-flow.
pub struct LogWorkflow {
    catalog: Vec<FoodItem>,
    state: State,
}

enum State {
    AwaitingFoodName,
    AwaitingServingSize { food: FoodItem },
    Finished(Outcome),
}

/// Terminal result of one logging workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A serving was computed and handed to the caller to persist.
    Logged,
    /// The user backed out at the serving-size question.
    Cancelled,
    /// The typed name matched nothing in the catalog.
    NotFound,
    /// The serving size did not parse as a finite decimal.
    Invalid,
}

/// What the session should do after feeding one line to the machine.
#[derive(Debug, Default, PartialEq)]
pub struct Step {
    /// Lines to print, in order.
    pub lines: Vec<String>,
    /// A log entry to persist, present only on the logged path.
    pub persist: Option<PersistRequest>,
}

/// The data needed to append one entry to the user's log.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistRequest {
    pub food: String,
    pub serving_size: f64,
    pub calories: f64,
}

impl LogWorkflow {
    pub fn new(catalog: Vec<FoodItem>) -> Self {
        LogWorkflow {
            catalog,
            state: State::AwaitingFoodName,
        }
    }

    /// The question to put to the user next, or `None` once the machine
    /// is terminal.
    pub fn question(&self) -> Option<&'static str> {
        match self.state {
            State::AwaitingFoodName => Some(FOOD_PROMPT),
            State::AwaitingServingSize { .. } => Some(SERVING_PROMPT),
            State::Finished(_) => None,
        }
    }

    /// The terminal outcome, once the machine has finished.
    pub fn outcome(&self) -> Option<Outcome> {
        match self.state {
            State::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Advance the machine with one line of user input.
    pub fn feed(&mut self, line: &str) -> Step {
        match std::mem::replace(&mut self.state, State::Finished(Outcome::NotFound)) {
            State::AwaitingFoodName => self.on_food_name(line),
            State::AwaitingServingSize { food } => self.on_serving_size(food, line),
            finished @ State::Finished(_) => {
                self.state = finished;
                Step::default()
            }
        }
    }

    fn on_food_name(&mut self, line: &str) -> Step {
        // case-sensitive exact match, first catalog hit wins
        match self.catalog.iter().find(|food| food.name == line) {
            Some(food) => {
                let food = food.clone();
                let announce = format!("{} has {} calories", food.name, food.calories);
                self.state = State::AwaitingServingSize { food };
                Step {
                    lines: vec![announce],
                    persist: None,
                }
            }
            None => {
                // unknown food: end silently, nothing logged
                self.state = State::Finished(Outcome::NotFound);
                Step::default()
            }
        }
    }

    fn on_serving_size(&mut self, food: FoodItem, line: &str) -> Step {
        let answer = line.trim();
        if answer == "nevermind" || answer == "n" {
            self.state = State::Finished(Outcome::Cancelled);
            return Step::default();
        }
        match answer.parse::<f64>() {
            Ok(serving_size) if serving_size.is_finite() => {
                let calories = compute_calories(&food, serving_size);
                self.state = State::Finished(Outcome::Logged);
                Step {
                    lines: vec![format!(
                        "{} with a serving size of {} has a {} calories",
                        food.name,
                        answer,
                        calories.round()
                    )],
                    persist: Some(PersistRequest {
                        food: food.name,
                        serving_size,
                        calories,
                    }),
                }
            }
            _ => {
                self.state = State::Finished(Outcome::Invalid);
                Step {
                    lines: vec![format!(
                        "error: \"{}\" is not a decimal serving size",
                        answer
                    )],
                    persist: None,
                }
            }
        }
    }
}
