mod execution;
mod schema;
mod starwars;
mod validation;
