/// Static help text, shown to anyone who asks.
pub const HELP_TEXT: &str = "\
**Registration bot**

**Unrestricted commands**

* `help`: Shows this help

**Restricted commands**

* `list`: Lists all registration tokens
* `show <token>`: Shows token details in human-readable format
* `create`: Creates a token that is valid for one registration for seven days
* `delete <token>`: Deletes the specified token(s)
* `delete-all`: Deletes all tokens
* `allow @user:example.com`: Allows the specified user (or a user matching a regex pattern) to use restricted commands
* `disallow @user:example.com`: Stops a specified user (or a user matching a regex pattern) from using restricted commands
";
