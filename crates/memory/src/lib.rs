//! Knowledge access: query embeddings and the thread store that resolves
//! corpus ids to displayable content.

pub mod embeddings;
pub mod embeddings_openai;
pub mod threads;
pub mod threads_sqlite;
