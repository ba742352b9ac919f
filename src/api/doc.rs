use utoipa::OpenApi;

pub const COMMENT_TAG: &str = "Book-Comment";

#[derive(OpenApi)]
#[openapi(
    info(title = "Bookshelf comment API"),
    tags(
        (name = COMMENT_TAG, description = "Book comment API endpoints"),
        (name = "Identity", description = IDENTITY_DESCRIPTION),
        (name = "Responses", description = RESPONSE_DESCRIPTION),
    )
)]
pub struct ApiDoc;

const IDENTITY_DESCRIPTION: &str = r#"
This server does not authenticate anyone itself. It expects to sit behind a
gateway that does, and which forwards the id of the authenticated user in the
`X-User-Id` header. Requests without the header are anonymous. Anonymous
clients can read comments but cannot create or delete them.

A header that is not an integer, or that names a user who does not exist, is
reported as an error.
"#;

const RESPONSE_DESCRIPTION: &str = r#"
Every response, including errors, is sent with status code 200 and a JSON body
of the following shape:

```json
{
    "state": "success",
    "message": <human readable message>,
    "data": <payload>
}
```

`state` is either `success` or `error`. `data` is left out when an operation
has no payload, and always on errors, where `message` explains what went
wrong.
"#;
