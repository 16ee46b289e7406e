use litebrowse_core::store::StoreError;

use crate::sqlite::SqliteStore;

/// Drops and recreates the fixed set of demo tables with representative
/// data. Destructive by design; the binary asks for confirmation first when
/// the database already has tables.
pub fn seed_demo(store: &SqliteStore) -> Result<(), StoreError> {
    tracing::debug!("seeding demo tables");
    store.execute_batch(SEED_SQL)
}

/// Creates the minimal `user` table with a few rows when it does not exist
/// yet, so a freshly created database has something to browse.
pub fn insert_dummy(store: &SqliteStore) -> Result<(), StoreError> {
    store.execute_batch(
        "CREATE TABLE IF NOT EXISTS user (\
         id INTEGER PRIMARY KEY AUTOINCREMENT,\
         name TEXT NOT NULL);\
         INSERT INTO user (name) \
         SELECT value FROM (SELECT 'Kevin' AS value UNION ALL SELECT 'Mike' UNION ALL SELECT 'Brandon') \
         WHERE NOT EXISTS (SELECT 1 FROM user);",
    )
}

const SEED_SQL: &str = r"
PRAGMA foreign_keys = OFF;

DROP TABLE IF EXISTS orders;
DROP TABLE IF EXISTS categories;
DROP TABLE IF EXISTS products;
DROP TABLE IF EXISTS users;

PRAGMA foreign_keys = ON;

CREATE TABLE users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    age INTEGER,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    is_active BOOLEAN DEFAULT 1
);

INSERT INTO users (username, email, full_name, age, is_active) VALUES
    ('jdoe', 'john.doe@example.com', 'John Doe', 28, 1),
    ('asmith', 'alice.smith@example.com', 'Alice Smith', 34, 1),
    ('bwilliams', 'bob.williams@example.com', 'Bob Williams', 45, 1),
    ('cjohnson', 'carol.johnson@example.com', 'Carol Johnson', 29, 0),
    ('dmiller', 'david.miller@example.com', 'David Miller', 52, 1),
    ('ebrown', 'emma.brown@example.com', 'Emma Brown', 23, 1);

CREATE TABLE products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    price DECIMAL(10, 2) NOT NULL,
    stock_quantity INTEGER NOT NULL,
    description TEXT,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
);

INSERT INTO products (name, category, price, stock_quantity, description) VALUES
    ('Laptop Pro 15', 'Electronics', 1299.99, 45, 'High-performance laptop with 16GB RAM'),
    ('Wireless Mouse', 'Electronics', 29.99, 230, 'Ergonomic wireless mouse with USB receiver'),
    ('Office Chair', 'Furniture', 249.50, 67, 'Comfortable ergonomic office chair'),
    ('Standing Desk', 'Furniture', 499.99, 23, 'Adjustable height standing desk'),
    ('USB-C Cable', 'Electronics', 12.99, 450, 'Durable USB-C charging cable'),
    ('Desk Lamp', 'Furniture', 39.99, 120, 'LED desk lamp with adjustable brightness'),
    ('Coffee Maker', 'Appliances', 69.99, 52, 'Programmable coffee maker with thermal carafe'),
    ('Headphones', 'Electronics', 159.99, 102, 'Noise-cancelling wireless headphones');

CREATE TABLE categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT,
    parent_category_id INTEGER,
    FOREIGN KEY (parent_category_id) REFERENCES categories(id)
);

INSERT INTO categories (name, description, parent_category_id) VALUES
    ('Electronics', 'Electronic devices and accessories', NULL),
    ('Furniture', 'Home and office furniture', NULL),
    ('Appliances', 'Home appliances', NULL),
    ('Computers', 'Computer hardware', 1),
    ('Audio', 'Audio equipment', 1);

CREATE TABLE orders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    order_date DATETIME DEFAULT CURRENT_TIMESTAMP,
    total_amount DECIMAL(10, 2) NOT NULL,
    status TEXT NOT NULL CHECK(status IN ('pending', 'processing', 'shipped', 'delivered', 'cancelled')),
    shipping_address TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id)
);

INSERT INTO orders (user_id, order_date, total_amount, status, shipping_address) VALUES
    (1, '2024-10-15 10:23:45', 1329.98, 'delivered', '123 Main St, Springfield, IL 62701'),
    (2, '2024-10-18 14:32:11', 249.50, 'delivered', '456 Oak Ave, Portland, OR 97201'),
    (3, '2024-10-20 09:15:33', 89.99, 'shipped', '789 Pine Rd, Austin, TX 78701'),
    (1, '2024-10-22 16:44:22', 79.99, 'processing', '123 Main St, Springfield, IL 62701'),
    (4, '2024-10-25 11:05:44', 499.99, 'pending', '321 Elm St, Seattle, WA 98101'),
    (5, '2024-10-27 13:28:56', 159.99, 'delivered', '654 Maple Dr, Boston, MA 02101');
";

#[cfg(test)]
mod tests {
    use super::{insert_dummy, seed_demo};
    use crate::sqlite::SqliteStore;

    #[test]
    fn seed_creates_the_demo_tables() {
        let store = SqliteStore::open(":memory:").expect("in-memory database should open");
        seed_demo(&store).expect("seed should succeed");

        let tables = store.list_tables().expect("listing should succeed");
        assert_eq!(tables, vec!["categories", "orders", "products", "users"]);

        let users = store.table_info("users").expect("table info should succeed");
        assert_eq!(users.row_count, Some(6));
    }

    #[test]
    fn seed_overwrites_previous_demo_data() {
        let store = SqliteStore::open(":memory:").expect("in-memory database should open");
        seed_demo(&store).expect("first seed should succeed");
        store
            .execute("DELETE FROM products")
            .expect("delete should succeed");

        seed_demo(&store).expect("second seed should succeed");
        let products = store
            .table_info("products")
            .expect("table info should succeed");
        assert_eq!(products.row_count, Some(8));
    }

    #[test]
    fn dummy_rows_are_inserted_only_once() {
        let store = SqliteStore::open(":memory:").expect("in-memory database should open");
        insert_dummy(&store).expect("first call should succeed");
        insert_dummy(&store).expect("second call should succeed");

        let info = store.table_info("user").expect("table info should succeed");
        assert_eq!(info.row_count, Some(3));
    }
}
