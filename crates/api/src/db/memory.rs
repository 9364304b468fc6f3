//! In-memory implementation of every repository trait.
//!
//! Used by unit and router tests. It enforces the same uniqueness and
//! reference rules as the `PostgreSQL` schema so conflict paths can be
//! exercised without a database. Listings are always ordered by id, in the
//! requested direction; other sort columns are accepted but ignored.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use succulent_shop_core::pagination::{PageSpec, SortDirection};
use succulent_shop_core::product::ProductDraft;
use succulent_shop_core::requests::{
    BlogDraft, BlogSearch, CategoryDraft, CommentDraft, PlantDraft, PlantFilter, ProductFilter,
    RatingDraft, UserDraft,
};
use succulent_shop_core::{
    BlogId, CategoryId, CommentId, Email, NotificationId, Order, OrderId, OrderStatus, Page,
    PlantId, Product, ProductId, RatingId, UserId,
};

use super::{
    BlogRepository, CategoryRepository, CommentRepository, HealthCheck, NewOrder,
    OrderRepository, OutboxRepository, PlantRepository, ProductRepository, RatingRepository,
    RepositoryError, UserRepository,
};
use crate::models::{
    Blog, Category, Comment, NewNotification, Notification, NotificationStatus, Plant, Rating,
    User,
};

#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    sequences: HashMap<&'static str, i64>,
    categories: BTreeMap<CategoryId, Category>,
    plants: BTreeMap<PlantId, Plant>,
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, Order>,
    users: BTreeMap<UserId, User>,
    ratings: BTreeMap<RatingId, Rating>,
    blogs: BTreeMap<BlogId, Blog>,
    comments: BTreeMap<CommentId, Comment>,
    notifications: BTreeMap<NotificationId, Notification>,
}

impl Tables {
    fn next_id(&mut self, table: &'static str) -> i64 {
        let next = self.sequences.entry(table).or_insert(0);
        *next += 1;
        *next
    }
}

fn conflict(message: &str) -> RepositoryError {
    RepositoryError::Conflict(message.to_owned())
}

fn paginate<T>(mut items: Vec<T>, spec: &PageSpec) -> Page<T> {
    if spec.direction == SortDirection::Desc {
        items.reverse();
    }
    let total = items.len() as u64;
    let offset = usize::try_from(spec.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(spec.limit()).unwrap_or(usize::MAX);
    let content = items.into_iter().skip(offset).take(limit).collect();
    Page::new(content, spec, total)
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.data.read().await.products.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data
            .products
            .values()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn list(&self, page: &PageSpec) -> Result<Page<Product>, RepositoryError> {
        ProductRepository::search(self, &ProductFilter::default(), page).await
    }

    async fn search(
        &self,
        filter: &ProductFilter,
        page: &PageSpec,
    ) -> Result<Page<Product>, RepositoryError> {
        let data = self.data.read().await;
        let matching = data
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        Ok(paginate(matching, page))
    }

    async fn insert(
        &self,
        draft: &ProductDraft,
        photo: Option<&str>,
    ) -> Result<Product, RepositoryError> {
        let mut data = self.data.write().await;
        if draft.plant_id.is_some_and(|id| !data.plants.contains_key(&id)) {
            return Err(conflict("product references a plant that does not exist"));
        }
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(data.next_id("products")),
            name: draft.name.clone(),
            description: draft.description.clone(),
            product_type: draft.product_type,
            plant_id: draft.plant_id,
            is_pot: draft.is_pot,
            pot_size: draft.pot_size,
            pot_type: draft.pot_type,
            pot_number: draft.pot_number,
            tool_type: draft.tool_type,
            base_price: draft.base_price,
            quantity: draft.quantity,
            active: draft.active,
            on_sale: false,
            photo: photo.map(str::to_owned),
            created_at: now,
            updated_at: now,
        };
        data.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
        photo: Option<&str>,
    ) -> Result<Product, RepositoryError> {
        let mut data = self.data.write().await;
        if draft.plant_id.is_some_and(|id| !data.plants.contains_key(&id)) {
            return Err(conflict("product references a plant that does not exist"));
        }
        let product = data.products.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        product.name.clone_from(&draft.name);
        product.description.clone_from(&draft.description);
        product.product_type = draft.product_type;
        product.plant_id = draft.plant_id;
        product.is_pot = draft.is_pot;
        product.pot_size = draft.pot_size;
        product.pot_type = draft.pot_type;
        product.pot_number = draft.pot_number;
        product.tool_type = draft.tool_type;
        product.base_price = draft.base_price;
        product.quantity = draft.quantity;
        product.active = draft.active;
        if let Some(photo) = photo {
            product.photo = Some(photo.to_owned());
        }
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn set_on_sale(&self, id: ProductId, on_sale: bool) -> Result<Product, RepositoryError> {
        let mut data = self.data.write().await;
        let product = data.products.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        product.on_sale = on_sale;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut data = self.data.write().await;
        let referenced = data
            .orders
            .values()
            .any(|o| o.items.iter().any(|item| item.product_id == id))
            || data.ratings.values().any(|r| r.product_id == id);
        if referenced && data.products.contains_key(&id) {
            return Err(conflict("product is still referenced by orders or ratings"));
        }
        Ok(data.products.remove(&id).is_some())
    }

    async fn photo_names(&self) -> Result<Vec<String>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.products.values().filter_map(|p| p.photo.clone()).collect())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn place(&self, order: &NewOrder, now: DateTime<Utc>) -> Result<Order, RepositoryError> {
        let mut data = self.data.write().await;
        if !data.users.contains_key(&order.user_id) {
            return Err(conflict("order references a user that does not exist"));
        }
        if order
            .items
            .iter()
            .any(|item| !data.products.contains_key(&item.product_id))
        {
            return Err(conflict("order references a product that does not exist"));
        }
        let placed = Order::place(
            OrderId::new(data.next_id("orders")),
            order.user_id,
            order.items.clone(),
            order.address.clone(),
            order.delivery_method,
            now,
        );
        data.orders.insert(placed.id, placed.clone());
        Ok(placed)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.data.read().await.orders.get(&id).cloned())
    }

    async fn list(&self, page: &PageSpec) -> Result<Page<Order>, RepositoryError> {
        let data = self.data.read().await;
        Ok(paginate(data.orders.values().cloned().collect(), page))
    }

    async fn list_by_user(
        &self,
        user_id: UserId,
        page: &PageSpec,
    ) -> Result<Page<Order>, RepositoryError> {
        let data = self.data.read().await;
        let orders = data
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        Ok(paginate(orders, page))
    }

    async fn save_transition(
        &self,
        order: &Order,
        previous: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let mut data = self.data.write().await;
        let stored = data.orders.get_mut(&order.id).ok_or(RepositoryError::NotFound)?;
        if stored.status != previous {
            return Err(conflict("order status was changed by another request"));
        }
        stored.status = order.status;
        stored.update_log.clone_from(&order.update_log);
        stored.updated_at = order.updated_at;
        Ok(())
    }

    async fn delete(&self, id: OrderId) -> Result<bool, RepositoryError> {
        Ok(self.data.write().await.orders.remove(&id).is_some())
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self.data.read().await.categories.get(&id).cloned())
    }

    async fn list(&self, page: &PageSpec) -> Result<Page<Category>, RepositoryError> {
        let data = self.data.read().await;
        Ok(paginate(data.categories.values().cloned().collect(), page))
    }

    async fn insert(&self, draft: &CategoryDraft) -> Result<Category, RepositoryError> {
        let mut data = self.data.write().await;
        let now = Utc::now();
        let category = Category {
            id: CategoryId::new(data.next_id("categories")),
            name: draft.name.clone(),
            description: draft.description.clone(),
            created_at: now,
            updated_at: now,
        };
        data.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update(
        &self,
        id: CategoryId,
        draft: &CategoryDraft,
    ) -> Result<Category, RepositoryError> {
        let mut data = self.data.write().await;
        let category = data.categories.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        category.name.clone_from(&draft.name);
        category.description.clone_from(&draft.description);
        category.updated_at = Utc::now();
        Ok(category.clone())
    }

    async fn delete(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let mut data = self.data.write().await;
        if data.plants.values().any(|p| p.category_id == id) {
            return Err(conflict("category still has plants"));
        }
        Ok(data.categories.remove(&id).is_some())
    }
}

fn plant_matches(filter: &PlantFilter, plant: &Plant) -> bool {
    let name = plant.name.to_lowercase();
    let care = plant
        .care_instructions
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    filter
        .search_term
        .as_deref()
        .is_none_or(|term| name.contains(term) || care.contains(term))
        && filter.name.as_deref().is_none_or(|n| name.contains(n))
        && filter.primary_color.is_none_or(|c| plant.primary_color == Some(c))
        && filter.secondary_color.is_none_or(|c| plant.secondary_color == Some(c))
        && filter.bloom_color.is_none_or(|c| plant.bloom_color == Some(c))
        && filter.category_id.is_none_or(|c| plant.category_id == c)
}

#[async_trait]
impl PlantRepository for MemoryStore {
    async fn get(&self, id: PlantId) -> Result<Option<Plant>, RepositoryError> {
        Ok(self.data.read().await.plants.get(&id).cloned())
    }

    async fn list(&self, page: &PageSpec) -> Result<Page<Plant>, RepositoryError> {
        PlantRepository::search(self, &PlantFilter::default(), page).await
    }

    async fn search(
        &self,
        filter: &PlantFilter,
        page: &PageSpec,
    ) -> Result<Page<Plant>, RepositoryError> {
        let data = self.data.read().await;
        let matching = data
            .plants
            .values()
            .filter(|p| plant_matches(filter, p))
            .cloned()
            .collect();
        Ok(paginate(matching, page))
    }

    async fn insert(
        &self,
        draft: &PlantDraft,
        photo: Option<&str>,
    ) -> Result<Plant, RepositoryError> {
        let mut data = self.data.write().await;
        if !data.categories.contains_key(&draft.category_id) {
            return Err(conflict("plant references a category that does not exist"));
        }
        let now = Utc::now();
        let plant = Plant {
            id: PlantId::new(data.next_id("plants")),
            name: draft.name.clone(),
            category_id: draft.category_id,
            primary_color: draft.primary_color,
            secondary_color: draft.secondary_color,
            bloom_color: draft.bloom_color,
            care_instructions: draft.care_instructions.clone(),
            photo: photo.map(str::to_owned),
            created_at: now,
            updated_at: now,
        };
        data.plants.insert(plant.id, plant.clone());
        Ok(plant)
    }

    async fn update(
        &self,
        id: PlantId,
        draft: &PlantDraft,
        photo: Option<&str>,
    ) -> Result<Plant, RepositoryError> {
        let mut data = self.data.write().await;
        if !data.categories.contains_key(&draft.category_id) {
            return Err(conflict("plant references a category that does not exist"));
        }
        let plant = data.plants.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        plant.name.clone_from(&draft.name);
        plant.category_id = draft.category_id;
        plant.primary_color = draft.primary_color;
        plant.secondary_color = draft.secondary_color;
        plant.bloom_color = draft.bloom_color;
        plant.care_instructions.clone_from(&draft.care_instructions);
        if let Some(photo) = photo {
            plant.photo = Some(photo.to_owned());
        }
        plant.updated_at = Utc::now();
        Ok(plant.clone())
    }

    async fn delete(&self, id: PlantId) -> Result<bool, RepositoryError> {
        let mut data = self.data.write().await;
        if data.products.values().any(|p| p.plant_id == Some(id)) {
            return Err(conflict("plant is still referenced by products"));
        }
        Ok(data.plants.remove(&id).is_some())
    }

    async fn photo_names(&self) -> Result<Vec<String>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.plants.values().filter_map(|p| p.photo.clone()).collect())
    }
}

fn email_taken(data: &Tables, email: &Email, except: Option<UserId>) -> bool {
    data.users.values().any(|u| {
        Some(u.id) != except && u.email.as_str().eq_ignore_ascii_case(email.as_str())
    })
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.data.read().await.users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data
            .users
            .values()
            .find(|u| u.email.as_str().eq_ignore_ascii_case(email.as_str()))
            .cloned())
    }

    async fn list(&self, page: &PageSpec) -> Result<Page<User>, RepositoryError> {
        let data = self.data.read().await;
        Ok(paginate(data.users.values().cloned().collect(), page))
    }

    async fn insert(
        &self,
        draft: &UserDraft,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut data = self.data.write().await;
        if email_taken(&data, &draft.email, None) {
            return Err(conflict("email already exists"));
        }
        let now = Utc::now();
        let user = User {
            id: UserId::new(data.next_id("users")),
            firstname: draft.firstname.clone(),
            lastname: draft.lastname.clone(),
            email: draft.email.clone(),
            role: draft.role,
            address: draft.address.clone(),
            password_hash: password_hash.to_owned(),
            created_at: now,
            updated_at: now,
        };
        data.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(
        &self,
        id: UserId,
        draft: &UserDraft,
        password_hash: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let mut data = self.data.write().await;
        if email_taken(&data, &draft.email, Some(id)) {
            return Err(conflict("email already exists"));
        }
        let user = data.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        user.firstname.clone_from(&draft.firstname);
        user.lastname.clone_from(&draft.lastname);
        user.email = draft.email.clone();
        user.role = draft.role;
        user.address.clone_from(&draft.address);
        if let Some(hash) = password_hash {
            user.password_hash = hash.to_owned();
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let mut data = self.data.write().await;
        let referenced = data.orders.values().any(|o| o.user_id == id)
            || data.ratings.values().any(|r| r.user_id == id)
            || data.blogs.values().any(|b| b.author_id == id)
            || data.comments.values().any(|c| c.author_id == id);
        if referenced && data.users.contains_key(&id) {
            return Err(conflict("user still has orders, ratings or posts"));
        }
        Ok(data.users.remove(&id).is_some())
    }
}

#[async_trait]
impl RatingRepository for MemoryStore {
    async fn get(&self, id: RatingId) -> Result<Option<Rating>, RepositoryError> {
        Ok(self.data.read().await.ratings.get(&id).cloned())
    }

    async fn insert(&self, draft: &RatingDraft) -> Result<Rating, RepositoryError> {
        let mut data = self.data.write().await;
        if !data.users.contains_key(&draft.user_id)
            || !data.products.contains_key(&draft.product_id)
        {
            return Err(conflict("rating references a missing user or product"));
        }
        let rating = Rating {
            id: RatingId::new(data.next_id("ratings")),
            user_id: draft.user_id,
            product_id: draft.product_id,
            score: draft.score,
            comment: draft.comment.clone(),
            created_at: Utc::now(),
        };
        data.ratings.insert(rating.id, rating.clone());
        Ok(rating)
    }

    async fn list_by_product(
        &self,
        product_id: ProductId,
        page: &PageSpec,
    ) -> Result<Page<Rating>, RepositoryError> {
        let data = self.data.read().await;
        let ratings = data
            .ratings
            .values()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect();
        Ok(paginate(ratings, page))
    }

    async fn delete(&self, id: RatingId) -> Result<bool, RepositoryError> {
        Ok(self.data.write().await.ratings.remove(&id).is_some())
    }
}

fn blog_matches(search: &BlogSearch, blog: &Blog) -> bool {
    let tags = search.tag_list();
    (!search.published_only || blog.published)
        && search.term().is_none_or(|term| {
            blog.title.to_lowercase().contains(&term) || blog.content.to_lowercase().contains(&term)
        })
        && (tags.is_empty() || blog.tags.iter().any(|t| tags.contains(t)))
}

fn slug_taken(data: &Tables, slug: &str, except: Option<BlogId>) -> bool {
    data.blogs
        .values()
        .any(|b| Some(b.id) != except && b.slug == slug)
}

#[async_trait]
impl BlogRepository for MemoryStore {
    async fn get(&self, id: BlogId) -> Result<Option<Blog>, RepositoryError> {
        Ok(self.data.read().await.blogs.get(&id).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Blog>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.blogs.values().find(|b| b.slug == slug).cloned())
    }

    async fn increment_views_by_slug(&self, slug: &str) -> Result<Option<Blog>, RepositoryError> {
        let mut data = self.data.write().await;
        Ok(data.blogs.values_mut().find(|b| b.slug == slug).map(|blog| {
            blog.view_count += 1;
            blog.clone()
        }))
    }

    async fn list(&self, page: &PageSpec) -> Result<Page<Blog>, RepositoryError> {
        let data = self.data.read().await;
        Ok(paginate(data.blogs.values().cloned().collect(), page))
    }

    async fn search(
        &self,
        search: &BlogSearch,
        page: &PageSpec,
    ) -> Result<Page<Blog>, RepositoryError> {
        let data = self.data.read().await;
        let matching = data
            .blogs
            .values()
            .filter(|b| blog_matches(search, b))
            .cloned()
            .collect();
        Ok(paginate(matching, page))
    }

    async fn insert(
        &self,
        draft: &BlogDraft,
        author_id: UserId,
        photo: Option<&str>,
    ) -> Result<Blog, RepositoryError> {
        let mut data = self.data.write().await;
        if slug_taken(&data, &draft.slug, None) {
            return Err(conflict("slug already exists"));
        }
        if !data.users.contains_key(&author_id) {
            return Err(conflict("blog author does not exist"));
        }
        let now = Utc::now();
        let blog = Blog {
            id: BlogId::new(data.next_id("blogs")),
            title: draft.title.clone(),
            summary: draft.summary.clone(),
            excerpt: draft.excerpt.clone(),
            content: draft.content.clone(),
            author_id,
            slug: draft.slug.clone(),
            photo: photo.map(str::to_owned),
            tags: draft.tags.clone(),
            published: draft.published,
            view_count: 0,
            created_at: now,
            updated_at: now,
        };
        data.blogs.insert(blog.id, blog.clone());
        Ok(blog)
    }

    async fn update(
        &self,
        id: BlogId,
        draft: &BlogDraft,
        photo: Option<&str>,
    ) -> Result<Blog, RepositoryError> {
        let mut data = self.data.write().await;
        if slug_taken(&data, &draft.slug, Some(id)) {
            return Err(conflict("slug already exists"));
        }
        let blog = data.blogs.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        blog.title.clone_from(&draft.title);
        blog.summary.clone_from(&draft.summary);
        blog.excerpt.clone_from(&draft.excerpt);
        blog.content.clone_from(&draft.content);
        blog.slug.clone_from(&draft.slug);
        blog.tags.clone_from(&draft.tags);
        blog.published = draft.published;
        if let Some(photo) = photo {
            blog.photo = Some(photo.to_owned());
        }
        blog.updated_at = Utc::now();
        Ok(blog.clone())
    }

    async fn set_published(&self, id: BlogId, published: bool) -> Result<Blog, RepositoryError> {
        let mut data = self.data.write().await;
        let blog = data.blogs.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        blog.published = published;
        blog.updated_at = Utc::now();
        Ok(blog.clone())
    }

    async fn delete(&self, id: BlogId) -> Result<bool, RepositoryError> {
        let mut data = self.data.write().await;
        data.comments.retain(|_, c| c.blog_id != id);
        Ok(data.blogs.remove(&id).is_some())
    }

    async fn photo_names(&self) -> Result<Vec<String>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.blogs.values().filter_map(|b| b.photo.clone()).collect())
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn get(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        Ok(self.data.read().await.comments.get(&id).cloned())
    }

    async fn list_by_blog(&self, blog_id: BlogId) -> Result<Vec<Comment>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data
            .comments
            .values()
            .filter(|c| c.blog_id == blog_id)
            .cloned()
            .collect())
    }

    async fn insert(
        &self,
        draft: &CommentDraft,
        author_id: UserId,
        approved: bool,
    ) -> Result<Comment, RepositoryError> {
        let mut data = self.data.write().await;
        let parent_missing = draft
            .parent_id
            .is_some_and(|id| !data.comments.contains_key(&id));
        if !data.blogs.contains_key(&draft.blog_id)
            || !data.users.contains_key(&author_id)
            || parent_missing
        {
            return Err(conflict("comment references a missing post or comment"));
        }
        let now = Utc::now();
        let comment = Comment {
            id: CommentId::new(data.next_id("comments")),
            blog_id: draft.blog_id,
            author_id,
            content: draft.content.clone(),
            approved,
            parent_id: draft.parent_id,
            like_count: 0,
            created_at: now,
            updated_at: now,
        };
        data.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update_content(
        &self,
        id: CommentId,
        content: &str,
    ) -> Result<Comment, RepositoryError> {
        let mut data = self.data.write().await;
        let comment = data.comments.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        content.clone_into(&mut comment.content);
        comment.updated_at = Utc::now();
        Ok(comment.clone())
    }

    async fn approve(&self, id: CommentId) -> Result<Comment, RepositoryError> {
        let mut data = self.data.write().await;
        let comment = data.comments.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        comment.approved = true;
        comment.updated_at = Utc::now();
        Ok(comment.clone())
    }

    async fn delete(&self, id: CommentId) -> Result<bool, RepositoryError> {
        let mut data = self.data.write().await;
        let removed = data.comments.remove(&id).is_some();
        // Replies go with their parent, recursively.
        let mut orphaned: Vec<CommentId> = vec![id];
        while let Some(parent) = orphaned.pop() {
            let children: Vec<CommentId> = data
                .comments
                .values()
                .filter(|c| c.parent_id == Some(parent))
                .map(|c| c.id)
                .collect();
            for child in children {
                data.comments.remove(&child);
                orphaned.push(child);
            }
        }
        Ok(removed)
    }

    async fn list_pending(
        &self,
        blog_author: Option<UserId>,
    ) -> Result<Vec<Comment>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data
            .comments
            .values()
            .filter(|c| !c.approved)
            .filter(|c| {
                blog_author.is_none_or(|author| {
                    data.blogs
                        .get(&c.blog_id)
                        .is_some_and(|b| b.author_id == author)
                })
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OutboxRepository for MemoryStore {
    async fn enqueue(
        &self,
        notification: &NewNotification,
        now: DateTime<Utc>,
    ) -> Result<Notification, RepositoryError> {
        let mut data = self.data.write().await;
        let row = Notification {
            id: NotificationId::new(data.next_id("notifications")),
            recipient: notification.recipient.clone(),
            subject: notification.subject.clone(),
            text_body: notification.text_body.clone(),
            html_body: notification.html_body.clone(),
            status: NotificationStatus::Pending,
            attempts: 0,
            next_attempt_at: now,
            last_error: None,
            created_at: now,
            sent_at: None,
        };
        data.notifications.insert(row.id, row.clone());
        Ok(row)
    }

    async fn due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let data = self.data.read().await;
        let mut due: Vec<Notification> = data
            .notifications
            .values()
            .filter(|n| n.status == NotificationStatus::Pending && n.next_attempt_at <= now)
            .cloned()
            .collect();
        due.sort_by_key(|n| (n.next_attempt_at, n.id));
        due.truncate(usize::try_from(limit).unwrap_or_default());
        Ok(due)
    }

    async fn mark_sent(
        &self,
        id: NotificationId,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut data = self.data.write().await;
        let row = data.notifications.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        row.status = NotificationStatus::Sent;
        row.attempts += 1;
        row.sent_at = Some(now);
        row.last_error = None;
        Ok(())
    }

    async fn mark_retry(
        &self,
        id: NotificationId,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut data = self.data.write().await;
        let row = data.notifications.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        row.attempts += 1;
        row.last_error = Some(error.to_owned());
        row.next_attempt_at = next_attempt_at;
        Ok(())
    }

    async fn mark_failed(&self, id: NotificationId, error: &str) -> Result<(), RepositoryError> {
        let mut data = self.data.write().await;
        let row = data.notifications.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        row.status = NotificationStatus::Failed;
        row.attempts += 1;
        row.last_error = Some(error.to_owned());
        Ok(())
    }
}

impl MemoryStore {
    /// Every outbox row, in id order.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.data.read().await.notifications.values().cloned().collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use succulent_shop_core::PageRequest;

    use super::*;

    fn page(page: u32, size: u32) -> PageSpec {
        PageRequest::new(page, size).resolve(&[("id", "id")]).unwrap()
    }

    #[test]
    fn test_paginate_slices_and_counts() {
        let result = paginate((1..=7).collect::<Vec<i32>>(), &page(1, 3));
        assert_eq!(result.content, [4, 5, 6]);
        assert_eq!(result.total_elements, 7);
        assert_eq!(result.total_pages, 3);
    }

    #[test]
    fn test_paginate_descending_and_past_the_end() {
        let mut spec = page(0, 2);
        spec.direction = SortDirection::Desc;
        assert_eq!(paginate(vec![1, 2, 3], &spec).content, [3, 2]);
        assert!(paginate(vec![1, 2, 3], &page(5, 2)).content.is_empty());
    }

    #[tokio::test]
    async fn test_category_with_plants_cannot_be_deleted() {
        let store = MemoryStore::default();
        let category = CategoryRepository::insert(
            &store,
            &CategoryDraft {
                name: "Cacti".to_owned(),
                description: None,
            },
        )
        .await
        .unwrap();
        PlantRepository::insert(
            &store,
            &PlantDraft {
                name: "Saguaro".to_owned(),
                category_id: category.id,
                primary_color: None,
                secondary_color: None,
                bloom_color: None,
                care_instructions: None,
            },
            None,
        )
        .await
        .unwrap();

        let err = CategoryRepository::delete(&store, category.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_stale_transition_is_a_conflict() {
        let store = MemoryStore::default();
        {
            let mut data = store.data.write().await;
            let now = Utc::now();
            let order = Order::place(
                OrderId::new(1),
                UserId::new(1),
                Vec::new(),
                "Main St 1".to_owned(),
                succulent_shop_core::DeliveryMethod::StandardDelivery,
                now,
            );
            data.orders.insert(order.id, order);
        }
        let mut order = OrderRepository::get(&store, OrderId::new(1)).await.unwrap().unwrap();
        order.transition_to(OrderStatus::Processing, Utc::now()).unwrap();

        OrderRepository::save_transition(&store, &order, OrderStatus::Ordered)
            .await
            .unwrap();
        let err = OrderRepository::save_transition(&store, &order, OrderStatus::Ordered)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }
}
