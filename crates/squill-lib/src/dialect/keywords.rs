//! ANSI keyword lists.
//!
//! Reserved keywords can never be naked identifiers. Unreserved keywords can,
//! and only act as keywords where a grammar asks for them.

pub const RESERVED_KEYWORDS: &[&str] = &[
    "ALL", "AND", "AS", "ASC", "BETWEEN", "BY", "CASE", "CREATE", "CROSS", "DELETE", "DESC",
    "DISTINCT", "DROP", "ELSE", "END", "EXCEPT", "EXISTS", "FALSE", "FOR", "FROM", "FULL", "GRANT",
    "GROUP", "HAVING", "IN", "INNER", "INSERT", "INTERSECT", "INTO", "IS", "JOIN", "LEFT", "LIKE",
    "LIMIT", "NOT", "NULL", "ON", "OR", "ORDER", "OUTER", "REVOKE", "RIGHT", "SELECT", "SET",
    "TABLE", "THEN", "TO", "TRUE", "UNION", "UPDATE", "USING", "VALUES", "WHEN", "WHERE", "WITH",
];

pub const UNRESERVED_KEYWORDS: &[&str] = &[
    "ADD", "AFTER", "ALTER", "AUTO_INCREMENT", "CASCADE", "CHAIN", "COLUMN", "COMMENT", "COMMIT",
    "CONSTRAINT", "CURRENT", "DEFAULT", "ESCAPE", "FIRST", "FOLLOWING", "FOREIGN", "IF", "IGNORE",
    "ILIKE", "INTERVAL", "ISNULL", "KEY", "LAST", "MINUS", "MODIFY", "NAN", "NO", "NOTNULL",
    "NULLS", "OFFSET", "OPTION", "OVER", "OVERWRITE", "PARTITION", "PRECEDING", "PRIMARY",
    "PRIVILEGES", "PUBLIC", "RANGE", "REFERENCES", "REPLACE", "RESPECT", "RESTRICT", "RLIKE",
    "ROLE", "ROLLBACK", "ROW", "ROWS", "SCHEMA", "TABLES", "TEMP", "TEMPORARY", "UNBOUNDED",
    "UNIQUE", "USER", "VALUE", "VIEW", "WORK",
];

pub const BARE_FUNCTIONS: &[&str] = &["CURRENT_TIMESTAMP", "CURRENT_TIME", "CURRENT_DATE"];

pub const DATETIME_UNITS: &[&str] = &[
    "DAY", "DAYOFYEAR", "HOUR", "MILLISECOND", "MINUTE", "MONTH", "QUARTER", "SECOND", "WEEK",
    "WEEKDAY", "YEAR",
];
