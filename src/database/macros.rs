/// Defines a method on a store that runs a SurrealQL statement.
///
/// # Syntax
/// ```ignore
/// method_name(...arguments) -> [Output Type] where "sql query"
/// ```
/// Every argument is bound under its own name, so `$ad_id` in the query refers to the `ad_id`
/// argument. An output type of `()` executes the statement and discards its result.
///
/// # Example
///
/// ```ignore
/// impl SurrealStore {
///     define_query! {
///         views_of(ad_id: String) -> Vec<View>
///             where "SELECT * FROM views WHERE ad_id = $ad_id"
///     }
/// }
///
/// let views = store.views_of(ad_id.to_string()).await?;
/// ```
#[macro_export]
macro_rules! define_query {
    ($(#[$meta:meta])* $method:ident ($($binding:ident : $binding_type:ty),*) -> () where $query:literal) => {
        $(#[$meta])*
        #[tracing::instrument(skip(self))]
        async fn $method(&self, $($binding : $binding_type),*) -> $crate::database::Result<()> {
            self.database
                .sql($query)
                $(.bind((stringify!($binding), $binding)))*
                .execute()
                .await
        }
    };
    ($(#[$meta:meta])* $method:ident ($($binding:ident : $binding_type:ty),*) -> $export:ty where $query:literal) => {
        $(#[$meta])*
        #[tracing::instrument(skip(self))]
        async fn $method(&self, $($binding : $binding_type),*) -> $crate::database::Result<$export> {
            self.database
                .sql($query)
                $(.bind((stringify!($binding), $binding)))*
                .fetch()
                .await
        }
    };
}
