//! Exercise and quiz catalogs.
//!
//! A built-in catalog ships with the binary. A TOML file can replace its
//! exercises (and, optionally, its quiz questions).

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TutorError};
use crate::provision::SampleSchema;

/// Exercise difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Advanced];
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Beginner => write!(f, "Beginner"),
            Self::Intermediate => write!(f, "Intermediate"),
            Self::Advanced => write!(f, "Advanced"),
        }
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(format!(
                "Unknown level: {s}. Expected: beginner, intermediate or advanced"
            )),
        }
    }
}

/// A graded exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub level: Level,
    pub title: String,
    pub description: String,

    /// Sample database the exercise is written against.
    #[serde(default)]
    pub schema: SampleSchema,

    /// The authoritative answer.
    pub reference: String,

    pub hint: String,

    /// Column names the answer should produce. Shown to the learner, never
    /// used for grading.
    #[serde(default)]
    pub expected_columns: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    /// Other accepted ways of writing the answer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,
}

/// A multiple-choice quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct: String,
}

/// On-disk catalog layout.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    exercises: Vec<Exercise>,
    #[serde(default)]
    quiz: Vec<QuizQuestion>,
}

/// The exercises and quiz questions available to a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    exercises: Vec<Exercise>,
    quiz: Vec<QuizQuestion>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// Creates a catalog, checking it for duplicate exercises and broken
    /// quiz questions.
    pub fn new(exercises: Vec<Exercise>, quiz: Vec<QuizQuestion>) -> Result<Self> {
        let mut seen = HashSet::new();
        for exercise in &exercises {
            if exercise.title.trim().is_empty() {
                return Err(TutorError::catalog("exercise with an empty title"));
            }
            if exercise.reference.trim().is_empty() {
                return Err(TutorError::catalog(format!(
                    "exercise '{}' has no reference query",
                    exercise.title
                )));
            }
            if !seen.insert((exercise.level, exercise.title.to_lowercase())) {
                return Err(TutorError::catalog(format!(
                    "duplicate {} exercise '{}'",
                    exercise.level, exercise.title
                )));
            }
        }

        for question in &quiz {
            if !question.options.contains(&question.correct) {
                return Err(TutorError::catalog(format!(
                    "quiz question '{}' lists no option matching its answer '{}'",
                    question.question, question.correct
                )));
            }
        }

        Ok(Self { exercises, quiz })
    }

    /// Returns the catalog compiled into the binary.
    pub fn builtin() -> Self {
        Self {
            exercises: builtin_exercises(),
            quiz: builtin_quiz(),
        }
    }

    /// Loads a TOML catalog.
    ///
    /// The file's exercises replace the built-in ones; its quiz questions do
    /// too when present.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TutorError::catalog(format!("Failed to read catalog {}: {e}", path.display()))
        })?;

        let file: CatalogFile = toml::from_str(&content).map_err(|e| {
            TutorError::catalog(format!("Invalid catalog {}:\n  {}", path.display(), e))
        })?;

        if file.exercises.is_empty() {
            return Err(TutorError::catalog(format!(
                "catalog {} defines no exercises",
                path.display()
            )));
        }

        let quiz = if file.quiz.is_empty() {
            builtin_quiz()
        } else {
            file.quiz
        };
        Self::new(file.exercises, quiz)
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    /// Exercises of one tier, in catalog order.
    pub fn exercises_at(&self, level: Level) -> impl Iterator<Item = &Exercise> {
        self.exercises.iter().filter(move |e| e.level == level)
    }

    /// Looks up an exercise by tier and title, ignoring letter case.
    pub fn find(&self, level: Level, title: &str) -> Result<&Exercise> {
        let wanted = title.trim().to_lowercase();
        self.exercises
            .iter()
            .find(|e| e.level == level && e.title.to_lowercase() == wanted)
            .ok_or_else(|| TutorError::catalog(format!("no {level} exercise titled '{title}'")))
    }

    pub fn quiz(&self) -> &[QuizQuestion] {
        &self.quiz
    }
}

fn exercise(
    level: Level,
    schema: SampleSchema,
    title: &str,
    description: &str,
    reference: &str,
    hint: &str,
    expected_columns: &[&str],
) -> Exercise {
    Exercise {
        level,
        title: title.to_string(),
        description: description.to_string(),
        schema,
        reference: reference.to_string(),
        hint: hint.to_string(),
        expected_columns: expected_columns.iter().map(|c| c.to_string()).collect(),
        explanation: None,
        alternatives: Vec::new(),
    }
}

fn builtin_exercises() -> Vec<Exercise> {
    use Level::*;
    use SampleSchema::*;

    vec![
        exercise(
            Beginner,
            Employees,
            "Basic selection",
            "Write a query that selects every employee of the IT department.",
            "SELECT id, name, age, department, salary FROM employees WHERE department = 'IT' ORDER BY id;",
            "Use a WHERE clause to filter the rows. Don't forget to select every column.",
            &["id", "name", "age", "department", "salary"],
        ),
        Exercise {
            explanation: Some(
                "AVG() aggregates every row into one; AS gives the result column its name."
                    .to_string(),
            ),
            ..exercise(
                Beginner,
                Employees,
                "Aggregation",
                "Compute the average salary of all employees, naming the column average_salary.",
                "SELECT AVG(salary) as average_salary FROM employees;",
                "Use the AVG() function and an AS alias.",
                &["average_salary"],
            )
        },
        exercise(
            Beginner,
            Library,
            "Books by category",
            "List the title and author of every book in the Science category.",
            "SELECT title, author FROM books WHERE category = 'Science' ORDER BY title;",
            "Filter the books table on its category column.",
            &["title", "author"],
        ),
        exercise(
            Intermediate,
            Employees,
            "Joining tables",
            "Show each employee's name with the name and budget of their department. Sort by employee name.",
            "SELECT e.name as employee_name, d.name as department_name, d.budget FROM employees e JOIN departments d ON e.department = d.name ORDER BY employee_name;",
            "Use JOIN to combine both tables on the department name.",
            &["employee_name", "department_name", "budget"],
        ),
        exercise(
            Intermediate,
            Employees,
            "Grouping and aggregation",
            "Show the average salary per department, highest first. Name the column avg_salary.",
            "SELECT department, AVG(salary) as avg_salary FROM employees GROUP BY department ORDER BY avg_salary DESC;",
            "Use GROUP BY to group the rows and ORDER BY ... DESC to sort them.",
            &["department", "avg_salary"],
        ),
        exercise(
            Intermediate,
            Library,
            "Outstanding loans",
            "List the member name and book title of every loan that has not been returned yet.",
            "SELECT m.name AS member_name, b.title FROM loans l JOIN members m ON l.member_id = m.id JOIN books b ON l.book_id = b.id WHERE l.return_date IS NULL;",
            "Join loans to members and books, then keep the rows whose return_date IS NULL.",
            &["member_name", "title"],
        ),
        exercise(
            Advanced,
            Employees,
            "Subqueries",
            "Find the names and salaries of the employees who earn more than the average salary of all employees.",
            "SELECT name, salary FROM employees WHERE salary > (SELECT AVG(salary) FROM employees) ORDER BY salary DESC;",
            "Use a subquery in the WHERE clause.",
            &["name", "salary"],
        ),
        Exercise {
            explanation: Some(
                "RANK() restarts at 1 in every partition and gives tied salaries the same rank."
                    .to_string(),
            ),
            ..exercise(
                Advanced,
                Employees,
                "Window functions",
                "Show every employee with the rank of their salary within their department, highest first. Name the column salary_rank.",
                "SELECT name, department, salary, RANK() OVER (PARTITION BY department ORDER BY salary DESC) as salary_rank FROM employees ORDER BY department, salary_rank;",
                "Use a window function: RANK() OVER (PARTITION BY ... ORDER BY ...).",
                &["name", "department", "salary", "salary_rank"],
            )
        },
        Exercise {
            alternatives: vec![
                "SELECT name FROM members m WHERE NOT EXISTS (SELECT 1 FROM loans l WHERE l.member_id = m.id);"
                    .to_string(),
            ],
            ..exercise(
                Advanced,
                Library,
                "Members without loans",
                "Find the names of the members who have never borrowed a book.",
                "SELECT name FROM members WHERE id NOT IN (SELECT member_id FROM loans) ORDER BY name;",
                "Compare each member's id against the member_id values found in loans.",
                &["name"],
            )
        },
    ]
}

fn builtin_quiz() -> Vec<QuizQuestion> {
    let question = |question: &str, options: [&str; 4], correct: &str| QuizQuestion {
        question: question.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct: correct.to_string(),
    };

    vec![
        question(
            "Which SQL command retrieves data from a table?",
            ["SELECT", "UPDATE", "DELETE", "INSERT"],
            "SELECT",
        ),
        question(
            "How do you combine rows from two tables?",
            ["MERGE", "COMBINE", "JOIN", "CONNECT"],
            "JOIN",
        ),
        question(
            "Which clause filters the rows of a query?",
            ["FILTER", "HAVING", "GROUP", "WHERE"],
            "WHERE",
        ),
        question(
            "How do you sort query results in ascending order?",
            ["SORT BY", "ORDER BY ... ASC", "ORDER ASC", "ARRANGE BY"],
            "ORDER BY ... ASC",
        ),
        question(
            "Which function counts the number of records?",
            ["SUM()", "COUNT()", "TOTAL()", "NUM()"],
            "COUNT()",
        ),
        question(
            "Which operator matches values against a pattern?",
            ["MATCH", "LIKE", "CONTAINS", "PATTERN"],
            "LIKE",
        ),
        question(
            "Which constraint guarantees that every value in a column is different?",
            ["NOT NULL", "PRIMARY KEY", "FOREIGN KEY", "UNIQUE"],
            "UNIQUE",
        ),
    ]
}
