//! SQL migrations contributed by the books module.

/// Tables for books, their keywords and their images.
pub const INIT: &str = r#"
CREATE TABLE IF NOT EXISTS buch (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    version   INTEGER NOT NULL DEFAULT 0,
    isbn      TEXT    NOT NULL UNIQUE,
    rating    INTEGER NOT NULL CHECK (rating BETWEEN 0 AND 5),
    art       TEXT    NOT NULL CHECK (art IN ('EPUB', 'HARDCOVER', 'PAPERBACK')),
    preis     REAL    NOT NULL CHECK (preis >= 0),
    rabatt    REAL    NOT NULL CHECK (rabatt BETWEEN 0 AND 1),
    lieferbar BOOLEAN NOT NULL,
    datum     DATE,
    homepage  TEXT,
    titel     TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS buch_titel_idx ON buch (titel);

CREATE TABLE IF NOT EXISTS schlagwort (
    buch_id    INTEGER NOT NULL REFERENCES buch (id) ON DELETE CASCADE,
    schlagwort TEXT    NOT NULL,
    PRIMARY KEY (buch_id, schlagwort)
);

CREATE TABLE IF NOT EXISTS abbildung (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    buch_id      INTEGER NOT NULL REFERENCES buch (id) ON DELETE CASCADE,
    beschriftung TEXT    NOT NULL,
    content_type TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS abbildung_buch_id_idx ON abbildung (buch_id);
"#;

/// Sample catalog for development and tests.
pub const SEED: &str = r#"
INSERT INTO buch (id, version, isbn, rating, art, preis, rabatt, lieferbar, datum, homepage, titel) VALUES
    (1, 0, '978-3-897-22583-1', 4, 'EPUB',      11.1, 0.1,   1, '2022-02-01', 'https://acme.at',  'Alpha'),
    (2, 0, '978-3-827-31552-6', 2, 'HARDCOVER', 22.2, 0.022, 1, '2022-02-02', 'https://acme.biz', 'Beta'),
    (3, 0, '978-0-201-63361-0', 1, 'PAPERBACK', 33.3, 0.033, 1, '2022-02-03', 'https://acme.com', 'Gamma'),
    (4, 0, '978-0-007-09732-6', 3, 'HARDCOVER', 44.4, 0.044, 1, '2022-02-04', 'https://acme.de',  'Delta'),
    (5, 0, '978-3-824-40481-0', 2, 'EPUB',      55.5, 0.055, 0, '2022-02-05', 'https://acme.es',  'Epsilon'),
    (6, 1, '978-3-16-148410-0', 5, 'PAPERBACK', 66.6, 0.066, 1, '2022-02-06', 'https://acme.it',  'Java und TypeScript');

INSERT INTO schlagwort (buch_id, schlagwort) VALUES
    (1, 'JAVASCRIPT'),
    (2, 'TYPESCRIPT'),
    (3, 'JAVASCRIPT'),
    (3, 'TYPESCRIPT'),
    (5, 'TYPESCRIPT'),
    (6, 'TYPESCRIPT');

INSERT INTO abbildung (id, buch_id, beschriftung, content_type) VALUES
    (1, 1, 'Abbildung 1', 'image/png'),
    (2, 6, 'Cover', 'image/jpeg'),
    (3, 6, 'Rückseite', 'image/jpeg');
"#;
