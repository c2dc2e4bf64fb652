//! The built-in feature set: every entry the tool documents out of the box.
//!
//! Snippet sources are authored against the engine's deterministic
//! scheduling, so `expected_output` lists lines in completion order. Entries
//! whose documented behavior *is* a failure set `may_throw` and usually
//! narrow it with `fails_with`.

use crate::catalog::Catalog;
use crate::models::{Category, ErrorKind, FeatureEntry, Snippet};

fn prints(source: &str, lines: &[&str]) -> Snippet {
    Snippet {
        source: source.to_string(),
        expected_output: lines.iter().map(|l| l.to_string()).collect(),
        may_throw: false,
        fails_with: None,
    }
}

fn faults(source: &str, kind: ErrorKind) -> Snippet {
    Snippet {
        source: source.to_string(),
        expected_output: Vec::new(),
        may_throw: true,
        fails_with: Some(kind),
    }
}

/// A snippet that prints, then is allowed to end in a fault of `kind`.
fn prints_then_faults(source: &str, lines: &[&str], kind: ErrorKind) -> Snippet {
    Snippet {
        may_throw: true,
        fails_with: Some(kind),
        ..prints(source, lines)
    }
}

fn entry(id: &str, category: Category, description: &str, snippets: Vec<Snippet>) -> FeatureEntry {
    FeatureEntry {
        id: id.to_string(),
        category,
        description: description.to_string(),
        snippets,
    }
}

/// Build the built-in catalog.
pub fn seed() -> Catalog {
    let mut catalog = Catalog::new();
    for feature in features() {
        catalog.register(feature).expect("built-in catalog is valid");
    }
    catalog
}

fn features() -> Vec<FeatureEntry> {
    vec![
        // ------------------------------------------------------------
        // variable-declaration
        // ------------------------------------------------------------
        entry(
            "let-block-scope",
            Category::VariableDeclaration,
            "let bindings are scoped to the enclosing block; an inner \
             declaration shadows without touching the outer one.",
            vec![prints(
                "let x = 1;\n\
                 {\n\
                 \x20 let x = 2;\n\
                 \x20 console.log(x);\n\
                 }\n\
                 console.log(x);",
                &["2", "1"],
            )],
        ),
        entry(
            "const-block-scope",
            Category::VariableDeclaration,
            "const bindings do not leak out of their block; reading one \
             outside is a reference error.",
            vec![faults(
                "{\n\
                 \x20 const scoped = 'inner';\n\
                 }\n\
                 console.log(scoped);",
                ErrorKind::Reference,
            )],
        ),
        entry(
            "const-reassignment",
            Category::VariableDeclaration,
            "Reassigning a const binding is a type error.",
            vec![faults(
                "const limit = 10;\nlimit = 20;",
                ErrorKind::Type,
            )],
        ),
        entry(
            "typeof-undeclared",
            Category::VariableDeclaration,
            "typeof reports a type name instead of faulting, even for names \
             that were never declared.",
            vec![prints(
                "let n = 3;\n\
                 console.log(typeof n);\n\
                 console.log(typeof missing);",
                &["number", "undefined"],
            )],
        ),
        // ------------------------------------------------------------
        // destructuring
        // ------------------------------------------------------------
        entry(
            "object-destructuring",
            Category::Destructuring,
            "Object destructuring picks properties by name, with defaults \
             filling in only for undefined. Destructuring a nullish value \
             is a type error.",
            vec![
                prints(
                    "const user = { name: 'Ada', role: 'admin' };\n\
                     const { name, role } = user;\n\
                     console.log(name, role);",
                    &["Ada admin"],
                ),
                prints(
                    "const config = { port: 8080 };\n\
                     const { port, host = 'localhost' } = config;\n\
                     console.log(`${host}:${port}`);",
                    &["localhost:8080"],
                ),
                faults("const { value } = null;", ErrorKind::Type),
            ],
        ),
        entry(
            "array-destructuring-defaults",
            Category::Destructuring,
            "Array destructuring binds by position; element defaults apply \
             when the position is missing.",
            vec![prints(
                "const [first, second = 'fallback'] = ['only'];\n\
                 console.log(first);\n\
                 console.log(second);",
                &["only", "fallback"],
            )],
        ),
        entry(
            "destructuring-rest",
            Category::Destructuring,
            "A rest element collects everything the explicit bindings did \
             not take, for arrays and objects alike.",
            vec![
                prints(
                    "const [head, ...tail] = [1, 2, 3, 4];\n\
                     console.log(head);\n\
                     console.log(tail);",
                    &["1", "[ 2, 3, 4 ]"],
                ),
                prints(
                    "const { id, ...rest } = { id: 7, name: 'probe', active: true };\n\
                     console.log(id);\n\
                     console.log(rest);",
                    &["7", "{ name: 'probe', active: true }"],
                ),
            ],
        ),
        // ------------------------------------------------------------
        // spread-rest
        // ------------------------------------------------------------
        entry(
            "spread-merge-objects",
            Category::SpreadRest,
            "Spreading objects into a literal merges them left to right; a \
             later spread overwrites earlier values but keeps the key's \
             original position.",
            vec![prints(
                "const base = { a: 1, b: 2 };\n\
                 const patch = { b: 3, c: 4 };\n\
                 const merged = { ...base, ...patch };\n\
                 console.log(merged);",
                &["{ a: 1, b: 3, c: 4 }"],
            )],
        ),
        entry(
            "spread-in-array-literal",
            Category::SpreadRest,
            "Spreading inside an array literal splices the source's \
             elements in place; strings spread into their characters.",
            vec![
                prints(
                    "const mid = [2, 3];\n\
                     const all = [1, ...mid, 4];\n\
                     console.log(all);\n\
                     console.log(all.length);",
                    &["[ 1, 2, 3, 4 ]", "4"],
                ),
                prints(
                    "const letters = [...'abc'];\nconsole.log(letters);",
                    &["[ 'a', 'b', 'c' ]"],
                ),
            ],
        ),
        entry(
            "spread-call-args",
            Category::SpreadRest,
            "Spreading an array in a call passes its elements as separate \
             arguments.",
            vec![prints(
                "function area(w, h) {\n\
                 \x20 return w * h;\n\
                 }\n\
                 const dims = [3, 4];\n\
                 console.log(area(...dims));",
                &["12"],
            )],
        ),
        entry(
            "rest-params-sum",
            Category::SpreadRest,
            "A rest parameter collects trailing arguments into a real \
             array; with no arguments it is empty, not undefined.",
            vec![
                prints(
                    "function sum(...nums) {\n\
                     \x20 let total = 0;\n\
                     \x20 for (const n of nums) {\n\
                     \x20   total += n;\n\
                     \x20 }\n\
                     \x20 return total;\n\
                     }\n\
                     console.log(sum(1, 2, 3));",
                    &["6"],
                ),
                prints(
                    "function sum(...nums) {\n\
                     \x20 let total = 0;\n\
                     \x20 for (const n of nums) {\n\
                     \x20   total += n;\n\
                     \x20 }\n\
                     \x20 return total;\n\
                     }\n\
                     console.log(sum());",
                    &["0"],
                ),
            ],
        ),
        // ------------------------------------------------------------
        // template-literal
        // ------------------------------------------------------------
        entry(
            "template-interpolation",
            Category::TemplateLiteral,
            "Template literals interpolate arbitrary expressions, \
             stringifying the result in place.",
            vec![
                prints(
                    "const name = 'world';\n\
                     const count = 3;\n\
                     console.log(`hello ${name}, you have ${count} messages`);",
                    &["hello world, you have 3 messages"],
                ),
                prints(
                    "const price = 4;\nconsole.log(`total: ${price * 2 + 1}`);",
                    &["total: 9"],
                ),
            ],
        ),
        entry(
            "template-multiline",
            Category::TemplateLiteral,
            "Template literals keep embedded newlines, so one literal can \
             span several printed lines.",
            vec![prints(
                "const banner = `first\nsecond`;\nconsole.log(banner);",
                &["first", "second"],
            )],
        ),
        // ------------------------------------------------------------
        // arrow-function
        // ------------------------------------------------------------
        entry(
            "arrow-function-basics",
            Category::ArrowFunction,
            "Arrow functions: a concise body returns its expression, a \
             block body returns via return, and a single parameter needs \
             no parentheses.",
            vec![
                prints(
                    "const double = (n) => n * 2;\n\
                     const add = (a, b) => {\n\
                     \x20 return a + b;\n\
                     };\n\
                     console.log(double(5));\n\
                     console.log(add(2, 3));",
                    &["10", "5"],
                ),
                prints(
                    "const shout = word => `${word}!`;\nconsole.log(shout('go'));",
                    &["go!"],
                ),
            ],
        ),
        entry(
            "arrow-closures",
            Category::ArrowFunction,
            "Arrows close over their defining scope; each call of the \
             factory gets an independent captured binding.",
            vec![prints(
                "const makeCounter = () => {\n\
                 \x20 let count = 0;\n\
                 \x20 return () => {\n\
                 \x20   count += 1;\n\
                 \x20   return count;\n\
                 \x20 };\n\
                 };\n\
                 const next = makeCounter();\n\
                 console.log(next());\n\
                 console.log(next());\n\
                 console.log(next());",
                &["1", "2", "3"],
            )],
        ),
        entry(
            "array-map",
            Category::ArrowFunction,
            "map builds a new array by applying the arrow to each element; \
             the callback also receives the index.",
            vec![
                prints(
                    "const nums = [1, 2, 3];\n\
                     const squares = nums.map((n) => n * n);\n\
                     console.log(squares);",
                    &["[ 1, 4, 9 ]"],
                ),
                prints(
                    "const tags = ['a', 'b'];\n\
                     const labeled = tags.map((tag, i) => `${i}:${tag}`);\n\
                     console.log(labeled.join(', '));",
                    &["0:a, 1:b"],
                ),
            ],
        ),
        // ------------------------------------------------------------
        // async-control-flow
        // ------------------------------------------------------------
        entry(
            "async-timeout-order",
            Category::AsyncControlFlow,
            "setTimeout callbacks run after the synchronous statements \
             finish, even with a zero delay.",
            vec![prints(
                "console.log('start');\n\
                 setTimeout(() => {\n\
                 \x20 console.log('timeout');\n\
                 }, 0);\n\
                 console.log('end');",
                &["start", "end", "timeout"],
            )],
        ),
        entry(
            "promise-then-chain",
            Category::AsyncControlFlow,
            "then handlers run as microtasks after the synchronous \
             statements; each then feeds the next with its return value.",
            vec![prints(
                "Promise.resolve(2)\n\
                 \x20 .then((n) => n * 3)\n\
                 \x20 .then((n) => {\n\
                 \x20   console.log(n);\n\
                 \x20 });\n\
                 console.log('scheduled');",
                &["scheduled", "6"],
            )],
        ),
        entry(
            "async-await",
            Category::AsyncControlFlow,
            "await unwraps a promise's fulfillment value; an async \
             function's return value arrives as a promise.",
            vec![prints(
                "const fetchCount = async () => 41;\n\
                 async function main() {\n\
                 \x20 const count = await fetchCount();\n\
                 \x20 console.log(count + 1);\n\
                 }\n\
                 main();",
                &["42"],
            )],
        ),
        entry(
            "await-timer",
            Category::AsyncControlFlow,
            "Wrapping setTimeout in a promise gives an awaitable delay.",
            vec![prints(
                "function delay(ms) {\n\
                 \x20 return new Promise((resolve) => {\n\
                 \x20   setTimeout(resolve, ms);\n\
                 \x20 });\n\
                 }\n\
                 async function run() {\n\
                 \x20 console.log('before');\n\
                 \x20 await delay(10);\n\
                 \x20 console.log('after');\n\
                 }\n\
                 run();",
                &["before", "after"],
            )],
        ),
        entry(
            "async-error-handling",
            Category::AsyncControlFlow,
            "A rejected promise surfaces as a throw at the await site, \
             where ordinary try/catch handles it; catch does the same for \
             then-chains.",
            vec![
                prints(
                    "async function risky() {\n\
                     \x20 throw new RangeError('out of range');\n\
                     }\n\
                     async function main() {\n\
                     \x20 try {\n\
                     \x20   await risky();\n\
                     \x20 } catch (err) {\n\
                     \x20   console.log(`caught: ${err.message}`);\n\
                     \x20 }\n\
                     }\n\
                     main();",
                    &["caught: out of range"],
                ),
                prints(
                    "Promise.reject(new Error('boom'))\n\
                     \x20 .catch((err) => {\n\
                     \x20   console.log(`recovered: ${err.message}`);\n\
                     \x20 });",
                    &["recovered: boom"],
                ),
            ],
        ),
        // ------------------------------------------------------------
        // object-utility
        // ------------------------------------------------------------
        entry(
            "object-keys-values",
            Category::ObjectUtility,
            "Object.keys and Object.values list properties in insertion \
             order.",
            vec![prints(
                "const flags = { verbose: true, dryRun: false };\n\
                 console.log(Object.keys(flags));\n\
                 console.log(Object.values(flags));",
                &["[ 'verbose', 'dryRun' ]", "[ true, false ]"],
            )],
        ),
        entry(
            "object-entries-loop",
            Category::ObjectUtility,
            "Object.entries yields [key, value] pairs that destructure \
             cleanly in a for-of loop.",
            vec![prints(
                "const limits = { cpu: 4, memory: 8 };\n\
                 for (const [key, value] of Object.entries(limits)) {\n\
                 \x20 console.log(`${key} = ${value}`);\n\
                 }",
                &["cpu = 4", "memory = 8"],
            )],
        ),
        entry(
            "object-assign",
            Category::ObjectUtility,
            "Object.assign copies sources onto the target left to right \
             and returns the target.",
            vec![prints(
                "const defaults = { retries: 3, verbose: false };\n\
                 const overrides = { verbose: true };\n\
                 const settings = Object.assign({}, defaults, overrides);\n\
                 console.log(settings);",
                &["{ retries: 3, verbose: true }"],
            )],
        ),
        entry(
            "optional-chaining",
            Category::ObjectUtility,
            "?. short-circuits to undefined on a nullish link instead of \
             faulting.",
            vec![prints(
                "const config = { server: { host: 'api.local' } };\n\
                 console.log(config.server?.host);\n\
                 console.log(config.backup?.host);",
                &["api.local", "undefined"],
            )],
        ),
        // ------------------------------------------------------------
        // error-handling
        // ------------------------------------------------------------
        entry(
            "try-catch-finally",
            Category::ErrorHandling,
            "catch receives the thrown error value; finally runs on both \
             paths. Engine faults are catchable the same way as thrown \
             errors.",
            vec![
                prints(
                    "function parsePort(raw) {\n\
                     \x20 if (typeof raw !== 'string') {\n\
                     \x20   throw new TypeError('port must be a string');\n\
                     \x20 }\n\
                     \x20 return raw;\n\
                     }\n\
                     try {\n\
                     \x20 parsePort(8080);\n\
                     } catch (err) {\n\
                     \x20 console.log(`${err.name}: ${err.message}`);\n\
                     } finally {\n\
                     \x20 console.log('done');\n\
                     }",
                    &["TypeError: port must be a string", "done"],
                ),
                prints(
                    "try {\n\
                     \x20 missingThing();\n\
                     } catch (err) {\n\
                     \x20 console.log(err.name);\n\
                     }",
                    &["ReferenceError"],
                ),
            ],
        ),
        entry(
            "throw-range-error",
            Category::ErrorHandling,
            "A thrown RangeError escapes uncaught once the guard trips; \
             everything printed before the throw still counts.",
            vec![prints_then_faults(
                "function clamp(n) {\n\
                 \x20 if (n < 0 || n > 100) {\n\
                 \x20   throw new RangeError('value out of range');\n\
                 \x20 }\n\
                 \x20 return n;\n\
                 }\n\
                 console.log(clamp(50));\n\
                 clamp(400);",
                &["50"],
                ErrorKind::Range,
            )],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_loads_and_covers_every_category() {
        let catalog = seed();
        assert!(catalog.len() >= 20);
        for category in Category::ALL {
            assert!(
                !catalog.list_by_category(category).is_empty(),
                "no seeded features for {category}"
            );
        }
    }

    #[test]
    fn seed_contains_the_documented_ids() {
        let catalog = seed();
        for id in [
            "const-block-scope",
            "spread-merge-objects",
            "rest-params-sum",
            "async-timeout-order",
        ] {
            assert!(catalog.get(id).is_ok(), "missing seeded feature {id}");
        }
    }
}
