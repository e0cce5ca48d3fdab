pub const USER_COUNT_PER_PAGE: i64 = 10;
pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const SUBSCRIPTION_COUNT_PER_PAGE: i64 = 10;

pub const SHOPPING_LIST_HEADER: &str = "Groceries to buy:";
pub const SHOPPING_LIST_FILE_NAME: &str = "list_of_products.txt";

pub const DEFAULT_TAG_COLOR: &str = "#FF0000";

/// Cooking time is measured in minutes.
pub const MIN_COOKING_TIME: i32 = 2;
pub const MIN_INGREDIENT_AMOUNT: i32 = 1;
