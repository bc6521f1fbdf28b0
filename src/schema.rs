table! {
    books (id) {
        id -> Uuid,
        title -> Text,
        author -> Text,
        narrator -> Text,
        duration -> Text,
        rating -> Float8,
        reviews -> Int4,
        genre -> Text,
        description -> Text,
        publish_date -> Text,
        cover_url -> Nullable<Text>,
        cover_path -> Nullable<Text>,
        audio_url -> Nullable<Text>,
        audio_path -> Nullable<Text>,
        chapters -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    progress (user_id, book_id) {
        user_id -> Text,
        book_id -> Uuid,
        percent_complete -> Int4,
        position_seconds -> Float8,
        last_updated -> Timestamptz,
    }
}

table! {
    users (id) {
        id -> Uuid,
        email -> Text,
        preferences -> Jsonb,
        library -> Jsonb,
        progress_map -> Jsonb,
        created_at -> Timestamptz,
    }
}

allow_tables_to_appear_in_same_query!(books, progress, users,);
