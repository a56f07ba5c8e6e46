#![forbid(unsafe_code)]

use crate::exercise::{Exercise, ExerciseId};

// Every built-in drill works against the same two-table dataset so learners
// carry their mental model from one exercise to the next.
const SETUP_SQL: &str = r#"
DROP TABLE IF EXISTS orders;
DROP TABLE IF EXISTS users;

CREATE TABLE users (
  id INTEGER PRIMARY KEY,
  name TEXT,
  age INTEGER,
  city TEXT,
  email TEXT
);

INSERT INTO users (name, age, city, email) VALUES
  ('Alice', 25, 'New York', 'alice@example.com'),
  ('Bob', 30, 'San Francisco', 'bob@test.com'),
  ('Charlie', 35, 'New York', 'charlie@example.com'),
  ('David', 28, 'Chicago', 'david@test.com'),
  ('Eve', 22, 'San Francisco', 'eve@example.com');

CREATE TABLE orders (
  id INTEGER PRIMARY KEY,
  user_id INTEGER,
  amount INTEGER,
  item TEXT,
  order_date TEXT
);

INSERT INTO orders (user_id, amount, item, order_date) VALUES
  (1, 100, 'Laptop', '2023-01-10'),
  (1, 50, 'Mouse', '2023-01-15'),
  (2, 200, 'Monitor', '2023-02-01'),
  (4, 75, 'Keyboard', '2023-02-10'),
  (4, 150, 'Printer', '2023-02-20'),
  (1, 120, 'Desk', '2023-03-01');
"#;

fn drill(id: i64, title: &str, description: &str, solution_sql: &str, hint: &str) -> Exercise {
    Exercise {
        id: ExerciseId::new(id),
        title: title.to_string(),
        description: description.to_string(),
        setup_sql: SETUP_SQL.to_string(),
        solution_sql: solution_sql.to_string(),
        hint: Some(hint.to_string()),
        order: id,
        expected_columns: None,
    }
}

pub(super) fn exercises() -> Vec<Exercise> {
    vec![
        drill(
            1,
            "Select All Users",
            "Retrieve all columns for every user in the 'users' table.",
            "SELECT * FROM users;",
            "Use SELECT * to fetch all columns.",
        ),
        drill(
            2,
            "Filter by City",
            "Find all users who live in 'New York'.",
            "SELECT * FROM users WHERE city = 'New York';",
            "Use the WHERE clause to filter rows.",
        ),
        drill(
            3,
            "Sort by Age",
            "Retrieve all users sorted by their age from oldest to youngest.",
            "SELECT * FROM users ORDER BY age DESC;",
            "Use ORDER BY with the DESC keyword.",
        ),
        drill(
            4,
            "Count Users",
            "Count the total number of users in the table.",
            "SELECT COUNT(*) FROM users;",
            "Use the COUNT(*) aggregate function.",
        ),
        drill(
            5,
            "Specific Columns",
            "Retrieve only the name and email of users who are older than 25.",
            "SELECT name, email FROM users WHERE age > 25;",
            "List the column names separated by commas instead of using *.",
        ),
        drill(
            6,
            "Total Orders per User",
            "Calculate the total amount spent by each user. Show the user_id and the total amount (named total_amount).",
            "SELECT user_id, SUM(amount) as total_amount FROM orders GROUP BY user_id;",
            "Use SUM() with GROUP BY user_id.",
        ),
        drill(
            7,
            "Join Users and Orders",
            "List the name of the user and the item for every order placed.",
            "SELECT users.name, orders.item FROM orders JOIN users ON orders.user_id = users.id;",
            "Use JOIN ... ON to connect orders.user_id with users.id.",
        ),
        drill(
            8,
            "Filter Aggregates (HAVING)",
            "Find the user_ids of users who have spent more than 100 in total.",
            "SELECT user_id FROM orders GROUP BY user_id HAVING SUM(amount) > 100;",
            "WHERE filters rows before grouping; HAVING filters the groups.",
        ),
        drill(
            9,
            "Users Without Orders",
            "Find the names of users who have never placed an order.",
            "SELECT name FROM users WHERE id NOT IN (SELECT user_id FROM orders);",
            "Use a subquery with NOT IN.",
        ),
        drill(
            10,
            "Complex Challenge",
            "Find the name of the user who placed the single most expensive order.",
            "SELECT name FROM users JOIN orders ON users.id = orders.user_id ORDER BY amount DESC LIMIT 1;",
            "Join the tables, sort by amount descending, and keep one row.",
        ),
    ]
}
