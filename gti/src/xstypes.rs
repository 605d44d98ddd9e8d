/// An ordered, possibly empty list of child items, kept in document order.
pub type Sequence<T> = Vec<T>;
