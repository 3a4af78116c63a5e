mod common;

use common::{scalar_i64, with_stage_at};
use movies_core::{DbError, SqlValue, SCHEMA_VERSION};

#[test]
fn should_create_all_movie_tables() {
    with_stage_at("00", SCHEMA_VERSION, "01", |db, _| {
        let tables = db
            .select_multiple_rows("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .into_iter()
            .map(|row| row["name"].as_str().unwrap().to_string())
            .collect::<Vec<_>>();

        assert_eq!(
            tables,
            [
                "actors",
                "directors",
                "genres",
                "keywords",
                "movie_actors",
                "movie_directors",
                "movie_genres",
                "movie_keywords",
                "movie_production_companies",
                "movie_ratings",
                "movies",
                "production_companies",
            ]
        );
    });
}

#[test]
fn should_create_movies_table_with_expected_columns() {
    with_stage_at("00", SCHEMA_VERSION, "01", |db, _| {
        let columns = db
            .select_multiple_rows("SELECT name, pk FROM pragma_table_info('movies') ORDER BY cid")
            .unwrap();

        let names = columns
            .iter()
            .map(|row| row["name"].as_str().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            [
                "id",
                "imdb_id",
                "popularity",
                "budget",
                "budget_adjusted",
                "revenue",
                "revenue_adjusted",
                "original_title",
                "homepage",
                "tagline",
                "overview",
                "runtime",
                "release_date",
            ]
        );
        assert_eq!(columns[0]["pk"], SqlValue::Integer(1));
    });
}

#[test]
fn should_start_with_empty_tables() {
    with_stage_at("00", SCHEMA_VERSION, "01", |db, _| {
        assert_eq!(scalar_i64(db, "SELECT count(*) AS total FROM movies", "total"), 0);
        assert_eq!(
            scalar_i64(db, "SELECT count(*) AS total FROM movie_ratings", "total"),
            0
        );
    });
}

#[test]
fn should_assign_row_ids_on_insert() {
    with_stage_at("00", SCHEMA_VERSION, "01", |db, _| {
        let first = db.insert("INSERT INTO genres (genre) VALUES ('Western')").unwrap();
        let second = db.insert("INSERT INTO genres (genre) VALUES ('Horror')").unwrap();
        assert_eq!((first, second), (1, 2));
    });
}

#[test]
fn should_reject_link_rows_without_parents() {
    with_stage_at("00", SCHEMA_VERSION, "01", |db, _| {
        let err = db
            .insert("INSERT INTO movie_genres (genre_id, movie_id) VALUES (1, 1)")
            .unwrap_err();
        assert!(matches!(err, DbError::Sqlite(_)));
    });
}

#[test]
fn should_reject_ratings_outside_star_range() {
    with_stage_at("00", SCHEMA_VERSION, "01", |db, _| {
        db.insert("INSERT INTO movies (id, imdb_id, original_title) VALUES (1, 'tt0000001', 'Test')")
            .unwrap();

        let err = db
            .insert(
                "INSERT INTO movie_ratings (user_id, movie_id, rating, time_created)
                 VALUES (1, 'tt0000001', 7.5, '2017-01-01 00:00:00')",
            )
            .unwrap_err();
        assert!(matches!(err, DbError::Sqlite(_)));
    });
}
