//! Test Configuration
//!
//! Migration fixtures shared by the unit tests and the PostgreSQL integration tests.
//!
//! The default group models a small kitchen: `apple`, a repeatable `sauce`, a `knight` that
//! references both and has two historical revisions, and a `jedi` that references the knight
//! and carries a deliberately broken upgrade. The `person` group exercises enum types.

use crate::migration::{checksum, MigrationRegistry, SchemaMigration};

pub const APPLE_ID: i64 = -8_388_116_365_589_044_375;
pub const SAUCE_ID: i64 = 936_908_912_345_077_096;
pub const KNIGHT_ID: i64 = 6_067_387_809_931_810_870;
pub const JEDI_ID: i64 = 5_399_356_631_421_331_000;
pub const PERSON_ID: i64 = 936_908_912_751_334_464;

pub const PERSON_GROUP: &str = "person";

pub const APPLE_SCHEMA: &str = r#"
CREATE TABLE "apple" (
    "id" BIGINT NOT NULL GENERATED ALWAYS AS IDENTITY,
    "name" VARCHAR NOT NULL,
    CONSTRAINT "pkApple" PRIMARY KEY ("id")
);
"#;

pub const SAUCE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS "sauce" ();
ALTER TABLE "sauce"
    ADD COLUMN IF NOT EXISTS "id" BIGINT NOT NULL GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    ADD COLUMN IF NOT EXISTS "name" VARCHAR NOT NULL;
"#;

pub const KNIGHT_SCHEMA: &str = r#"
CREATE TABLE "knight" (
    "id" BIGINT NOT NULL GENERATED ALWAYS AS IDENTITY,
    "name" VARCHAR NOT NULL,
    "favoriteApple" BIGINT NOT NULL,
    "favoriteSauce" BIGINT NOT NULL,
    CONSTRAINT "pkKnight" PRIMARY KEY ("id"),
    CONSTRAINT "fkKnightFavoriteApple" FOREIGN KEY ("favoriteApple") REFERENCES "apple" ("id") ON UPDATE CASCADE ON DELETE CASCADE,
    CONSTRAINT "fkKnightFavoriteSauce" FOREIGN KEY ("favoriteSauce") REFERENCES "sauce" ("id") ON UPDATE CASCADE ON DELETE CASCADE
);
"#;

/// Normal checksum of the knight table holding only `id`
pub const KNIGHT_ID_ONLY: u32 = 1_305_369_197;

/// Normal checksum of the knight table holding `id` and `name`
pub const KNIGHT_WITH_NAME: u32 = 1_759_279_540;

pub const KNIGHT_ADD_NAME: &str = r#"
ALTER TABLE "knight" ADD COLUMN "name" VARCHAR NOT NULL;
"#;

pub const KNIGHT_ADD_FAVORITES: &str = r#"
ALTER TABLE "knight"
    ADD COLUMN "favoriteApple" BIGINT NOT NULL,
    ADD COLUMN "favoriteSauce" BIGINT NOT NULL,
    ADD CONSTRAINT "fkKnightFavoriteApple" FOREIGN KEY ("favoriteApple") REFERENCES "apple" ("id") ON UPDATE CASCADE ON DELETE CASCADE,
    ADD CONSTRAINT "fkKnightFavoriteSauce" FOREIGN KEY ("favoriteSauce") REFERENCES "sauce" ("id") ON UPDATE CASCADE ON DELETE CASCADE;
"#;

pub const JEDI_SCHEMA: &str = r#"
CREATE TABLE "jedi" (
    "knight" BIGINT NOT NULL,
    "midiChlorianDensity" FLOAT NOT NULL,
    CONSTRAINT "pkJedi" PRIMARY KEY ("knight"),
    CONSTRAINT "fkJediKnight" FOREIGN KEY ("knight") REFERENCES "knight" ("id") ON UPDATE CASCADE ON DELETE CASCADE
);
"#;

/// Normal checksum of the jedi table without `midiChlorianDensity`
pub const JEDI_WITHOUT_DENSITY: u32 = 242_734_274;

/// Fails on PostgreSQL: a FLOAT column cannot default to text
pub const JEDI_BROKEN_UPGRADE: &str = r#"
ALTER TABLE "jedi" ADD COLUMN "midiChlorianDensity" FLOAT NOT NULL DEFAULT 'test';
"#;

pub const PERSON_SCHEMA: &str = r#"
CREATE TABLE "person" (
    "id" BIGINT NOT NULL GENERATED ALWAYS AS IDENTITY,
    "favoriteColor" "color" NOT NULL,
    "handedness" "handedness" NOT NULL,
    CONSTRAINT "pkPerson" PRIMARY KEY ("id")
);
"#;

/// Normal checksum of the person table without `handedness`
pub const PERSON_WITHOUT_HANDEDNESS: u32 = 2_930_944_258;

pub const PERSON_ADD_HANDEDNESS: &str = r#"
ALTER TABLE "person" ADD COLUMN "handedness" "handedness" NOT NULL;
"#;

/// Reissued after the person table exists
pub const PERSON_EPILOGUE: &str = r#"
COMMENT ON TABLE "person" IS 'Someone with a favorite color';
"#;

pub const COLORS: [&str; 3] = ["RED", "GREEN", "BLUE"];
pub const HANDEDNESS: [&str; 2] = ["LEFT_HANDED", "RIGHT_HANDED"];

fn build(builder: crate::migration::SchemaMigrationBuilder) -> SchemaMigration {
    match builder.build() {
        Ok(migration) => migration,
        Err(e) => panic!("invalid fixture: {e}"),
    }
}

pub fn apple() -> SchemaMigration {
    build(
        SchemaMigration::builder(APPLE_ID)
            .name("apple")
            .schema(APPLE_SCHEMA),
    )
}

pub fn sauce() -> SchemaMigration {
    build(
        SchemaMigration::builder(SAUCE_ID)
            .name("sauce")
            .repeatable(SAUCE_SCHEMA),
    )
}

pub fn knight() -> SchemaMigration {
    build(
        SchemaMigration::builder(KNIGHT_ID)
            .name("knight")
            .schema(KNIGHT_SCHEMA)
            .upgrade(KNIGHT_ID_ONLY, KNIGHT_WITH_NAME, KNIGHT_ADD_NAME)
            .upgrade(
                KNIGHT_WITH_NAME,
                checksum::crc32(KNIGHT_SCHEMA),
                KNIGHT_ADD_FAVORITES,
            )
            .depends_on(APPLE_ID)
            .depends_on(SAUCE_ID),
    )
}

pub fn jedi() -> SchemaMigration {
    build(
        SchemaMigration::builder(JEDI_ID)
            .name("jedi")
            .schema(JEDI_SCHEMA)
            .upgrade(
                JEDI_WITHOUT_DENSITY,
                checksum::crc32(JEDI_SCHEMA),
                JEDI_BROKEN_UPGRADE,
            )
            .depends_on(KNIGHT_ID),
    )
}

pub fn person() -> SchemaMigration {
    build(
        SchemaMigration::builder(PERSON_ID)
            .name("person")
            .group(PERSON_GROUP)
            .schema(PERSON_SCHEMA)
            .enum_schema("color", COLORS, Vec::<String>::new())
            .enum_schema("handedness", HANDEDNESS, Vec::<String>::new())
            .epilogue(PERSON_EPILOGUE)
            .upgrade(
                PERSON_WITHOUT_HANDEDNESS,
                checksum::crc32(PERSON_SCHEMA),
                PERSON_ADD_HANDEDNESS,
            ),
    )
}

/// Registry holding the default group and the person group
pub fn registry() -> MigrationRegistry {
    let mut registry = MigrationRegistry::new();
    registry
        .register_schema(apple())
        .register_schema(sauce())
        .register_schema(knight())
        .register_schema(jedi())
        .register_schema(person());
    registry
}

/// Latest stored checksum of a fixture
pub fn latest(migration: &SchemaMigration) -> i64 {
    use crate::migration::Migration;
    migration.latest_checksum().unwrap_or_default()
}
